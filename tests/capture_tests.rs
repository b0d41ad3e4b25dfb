// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture controller

use media_picker::backends::camera::{CameraPosition, FocusPoint, VirtualCamera};
use media_picker::constants::{MAX_ZOOM_FACTOR, MIN_ZOOM_FACTOR};
use media_picker::picker::{CaptureController, CapturePhase};
use media_picker::CaptureError;
use std::sync::Arc;
use std::time::Duration;

fn ready_controller(camera: &VirtualCamera) -> CaptureController {
    let controller = CaptureController::new(Arc::new(camera.clone()));
    controller.configure(CameraPosition::Back).unwrap();
    controller
}

#[test]
fn test_zoom_clamped_for_any_request() {
    let camera = VirtualCamera::new();
    let controller = ready_controller(&camera);
    let ceiling = MAX_ZOOM_FACTOR.min(16.0);

    for scale in [-5.0, 0.0, 0.01, 1.0, 2.9, 3.1, 1e9, f32::NEG_INFINITY] {
        let zoom = controller.set_zoom(scale).unwrap();
        assert!(
            (MIN_ZOOM_FACTOR..=ceiling).contains(&zoom),
            "requested {} gave {}",
            scale,
            zoom
        );
    }
}

#[test]
fn test_zoom_limited_by_device() {
    let camera = VirtualCamera::new();
    let controller = ready_controller(&camera);
    // Front camera tops out below MAX_ZOOM_FACTOR on a narrower device
    controller.switch_camera().unwrap();
    let zoom = controller.set_zoom(100.0).unwrap();
    assert!(zoom <= MAX_ZOOM_FACTOR.min(4.0));
    assert_eq!(camera.log().zoom_factor, Some(zoom));
}

#[tokio::test]
async fn test_second_capture_rejected() {
    let camera = VirtualCamera::new().with_latency(Duration::from_millis(10));
    let controller = ready_controller(&camera);

    let first = controller.begin_capture(None).unwrap();
    let state = controller.state();

    assert_eq!(
        controller.capture(None).await.unwrap_err(),
        CaptureError::AlreadyCapturing
    );
    assert_eq!(controller.state(), state);

    first.await.unwrap();
    assert_eq!(camera.log().captures, 1);
    assert!(!controller.is_capturing());
}

#[tokio::test]
async fn test_capture_cancels_focus() {
    let camera = VirtualCamera::new();
    let controller = ready_controller(&camera);

    controller.focus_at(FocusPoint::new(0.1, 0.1)).unwrap();
    assert_eq!(controller.phase(), CapturePhase::Focusing);

    let item = controller.capture(None).await.unwrap();
    assert_eq!(item.size().width, 640);
    assert_eq!(controller.phase(), CapturePhase::Idle);
}

#[tokio::test]
async fn test_focus_rejected_while_capturing() {
    let camera = VirtualCamera::new().with_latency(Duration::from_millis(10));
    let controller = ready_controller(&camera);

    let pending = controller.begin_capture(None).unwrap();
    assert_eq!(
        controller.focus_at(FocusPoint::new(0.5, 0.5)),
        Err(CaptureError::AlreadyCapturing)
    );
    pending.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_focus_reverts_to_idle() {
    let camera = VirtualCamera::new();
    let controller = ready_controller(&camera);

    controller.focus_at(FocusPoint::new(0.3, 0.7)).unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(controller.phase(), CapturePhase::Idle);
    assert_eq!(camera.log().focus, Some(FocusPoint::new(0.3, 0.7)));
}
