// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! Sole owner of the camera hardware. Every control request (zoom, focus,
//! flash, camera switch, shutter) goes through here so the hardware never
//! sees overlapping calls.
//!
//! # State machine
//!
//! ```text
//!            focus_at            1s timeout / capture
//!   Idle ─────────────▶ Focusing ───────────────────▶ Idle
//!    │                     │
//!    │ begin_capture       │ begin_capture
//!    ▼                     ▼
//!   Capturing ──────── photo delivered ──────────────▶ Idle
//! ```
//!
//! Only one capture can be in flight. A second shutter request while
//! capturing is rejected, never queued.

use crate::backends::camera::{CameraHardware, CameraPosition, FlashMode, FocusPoint, Location};
use crate::constants::{FOCUS_REVERT_TIMEOUT, MAX_ZOOM_FACTOR, MIN_ZOOM_FACTOR};
use crate::errors::CaptureError;
use crate::media::MediaItem;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Coarse controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Focusing,
    Capturing,
}

/// Observable camera state
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureState {
    /// Active camera, `None` until the hardware has been configured
    pub position: Option<CameraPosition>,
    /// Current zoom factor
    pub zoom_factor: f32,
    /// Zoom factor at the start of the current pinch gesture
    pub zoom_base: f32,
    pub flash_mode: FlashMode,
    /// Last requested focus point
    pub focus_point: Option<FocusPoint>,
    /// Focus indicator is up and the revert timer is pending
    pub is_focusing: bool,
    pub is_capturing: bool,
}

impl CaptureState {
    fn new(min_zoom: f32) -> Self {
        Self {
            position: None,
            zoom_factor: min_zoom,
            zoom_base: min_zoom,
            flash_mode: FlashMode::default(),
            focus_point: None,
            is_focusing: false,
            is_capturing: false,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        if self.is_capturing {
            CapturePhase::Capturing
        } else if self.is_focusing {
            CapturePhase::Focusing
        } else {
            CapturePhase::Idle
        }
    }
}

/// Clamp a pinch gesture to the allowed zoom range
///
/// `scale` is the gesture's cumulative scale, applied to the zoom factor the
/// gesture started from. Non-finite products clamp to the nearest bound.
pub fn clamp_zoom(scale: f32, base: f32, min_zoom: f32, max_zoom: f32, device_max: f32) -> f32 {
    let upper = max_zoom.min(device_max).max(min_zoom);
    let requested = scale * base;
    if requested.is_nan() {
        return min_zoom;
    }
    requested.min(upper).max(min_zoom)
}

struct ControllerState {
    capture: CaptureState,
    focus_generation: u64,
    focus_timer: Option<JoinHandle<()>>,
}

impl ControllerState {
    fn cancel_focus_timer(&mut self) {
        if let Some(timer) = self.focus_timer.take() {
            timer.abort();
        }
        self.focus_generation += 1;
        self.capture.is_focusing = false;
    }
}

/// Clears the in-flight flag when the capture future completes or is dropped
struct CaptureGuard {
    state: Arc<Mutex<ControllerState>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.capture.is_capturing = false;
    }
}

/// Serializes access to the camera hardware
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct CaptureController {
    state: Arc<Mutex<ControllerState>>,
    hardware: Arc<dyn CameraHardware>,
    min_zoom: f32,
    max_zoom: f32,
    focus_timeout: Duration,
}

impl CaptureController {
    pub fn new(hardware: Arc<dyn CameraHardware>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                capture: CaptureState::new(MIN_ZOOM_FACTOR),
                focus_generation: 0,
                focus_timer: None,
            })),
            hardware,
            min_zoom: MIN_ZOOM_FACTOR,
            max_zoom: MAX_ZOOM_FACTOR,
            focus_timeout: FOCUS_REVERT_TIMEOUT,
        }
    }

    /// Override the focus indicator timeout
    pub fn with_focus_timeout(mut self, timeout: Duration) -> Self {
        self.focus_timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> CaptureState {
        self.lock().capture.clone()
    }

    pub fn phase(&self) -> CapturePhase {
        self.lock().capture.phase()
    }

    pub fn is_capturing(&self) -> bool {
        self.lock().capture.is_capturing
    }

    /// Hardware configured and ready for capture
    pub fn is_ready(&self) -> bool {
        self.lock().capture.position.is_some()
    }

    pub fn has_flash(&self) -> bool {
        self.is_ready() && self.hardware.has_flash()
    }

    /// Open the front or back camera
    ///
    /// Zoom resets to the minimum and the flash mode is re-applied.
    pub fn configure(&self, position: CameraPosition) -> Result<(), CaptureError> {
        let mut state = self.lock();
        if state.capture.is_capturing {
            return Err(CaptureError::AlreadyCapturing);
        }

        if let Err(e) = self.hardware.configure(position) {
            warn!(%position, error = %e, "Camera configuration failed");
            return Err(e);
        }

        state.cancel_focus_timer();
        state.capture.position = Some(position);
        state.capture.zoom_factor = self.min_zoom;
        state.capture.zoom_base = self.min_zoom;
        state.capture.focus_point = None;
        self.hardware.set_zoom_factor(self.min_zoom);
        self.hardware.set_flash_mode(state.capture.flash_mode);
        info!(%position, has_flash = self.hardware.has_flash(), "Camera configured");
        Ok(())
    }

    /// Toggle between front and back camera
    ///
    /// # Returns
    /// * `Ok(CameraPosition)` - The newly active camera
    /// * `Err(CaptureError::AlreadyCapturing)` - A capture is in flight
    /// * `Err(CaptureError::DeviceUnavailable)` - No camera on the other side
    pub fn switch_camera(&self) -> Result<CameraPosition, CaptureError> {
        let target = {
            let state = self.lock();
            if state.capture.is_capturing {
                return Err(CaptureError::AlreadyCapturing);
            }
            let current = state
                .capture
                .position
                .ok_or(CaptureError::DeviceUnavailable)?;
            current.toggled()
        };

        if !self.hardware.is_available(target) {
            debug!(%target, "No camera to switch to");
            return Err(CaptureError::DeviceUnavailable);
        }

        self.configure(target)?;
        Ok(target)
    }

    /// Anchor a new pinch gesture on the current zoom factor
    pub fn begin_zoom(&self) {
        let mut state = self.lock();
        state.capture.zoom_base = state.capture.zoom_factor;
    }

    /// Apply an in-progress pinch gesture
    ///
    /// Every call of one gesture scales the same base, so repeated events
    /// never compound. Returns the applied zoom factor.
    pub fn set_zoom(&self, scale: f32) -> Result<f32, CaptureError> {
        let mut state = self.lock();
        if state.capture.position.is_none() {
            return Err(CaptureError::DeviceUnavailable);
        }
        let factor = clamp_zoom(
            scale,
            state.capture.zoom_base,
            self.min_zoom,
            self.max_zoom,
            self.hardware.max_zoom_factor(),
        );
        state.capture.zoom_factor = factor;
        self.hardware.set_zoom_factor(factor);
        Ok(factor)
    }

    /// Apply the final scale of a pinch gesture and anchor the next gesture on it
    pub fn end_zoom(&self, scale: f32) -> Result<f32, CaptureError> {
        let factor = self.set_zoom(scale)?;
        self.lock().capture.zoom_base = factor;
        debug!(zoom = factor, "Zoom gesture committed");
        Ok(factor)
    }

    /// Focus on `point` and show the focus indicator
    ///
    /// The indicator reverts to idle after the focus timeout unless another
    /// focus request restarts the timer first.
    pub fn focus_at(&self, point: FocusPoint) -> Result<(), CaptureError> {
        let mut state = self.lock();
        if state.capture.position.is_none() {
            return Err(CaptureError::DeviceUnavailable);
        }
        if state.capture.is_capturing {
            return Err(CaptureError::AlreadyCapturing);
        }

        state.cancel_focus_timer();
        let generation = state.focus_generation;
        state.capture.focus_point = Some(point);
        state.capture.is_focusing = true;
        self.hardware.focus(point);
        debug!(x = point.x(), y = point.y(), "Focusing");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let shared = Arc::clone(&self.state);
                let timeout = self.focus_timeout;
                state.focus_timer = Some(runtime.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.focus_generation == generation {
                        state.capture.is_focusing = false;
                        state.focus_timer = None;
                    }
                }));
            }
            Err(_) => warn!("No async runtime; focus indicator will not auto-revert"),
        }
        Ok(())
    }

    /// Advance the flash mode through Auto -> On -> Off
    pub fn cycle_flash(&self) -> FlashMode {
        let mut state = self.lock();
        let mode = state.capture.flash_mode.next();
        state.capture.flash_mode = mode;
        if state.capture.position.is_some() {
            self.hardware.set_flash_mode(mode);
        }
        debug!(flash = mode.label(), "Flash mode changed");
        mode
    }

    /// Start a capture
    ///
    /// The in-flight flag is set before this returns, so a second call is
    /// rejected even if the first future has not been polled yet. The
    /// returned future clears the flag when it finishes or is dropped.
    pub fn begin_capture(
        &self,
        location: Option<Location>,
    ) -> Result<BoxFuture<'static, Result<MediaItem, CaptureError>>, CaptureError> {
        let mut state = self.lock();
        if state.capture.is_capturing {
            debug!("Capture rejected: already capturing");
            return Err(CaptureError::AlreadyCapturing);
        }
        if state.capture.position.is_none() {
            return Err(CaptureError::DeviceUnavailable);
        }

        state.cancel_focus_timer();
        state.capture.is_capturing = true;
        info!(location = location.is_some(), "Capture started");

        let guard = CaptureGuard {
            state: Arc::clone(&self.state),
        };
        let photo = self.hardware.capture_photo(location);

        Ok(Box::pin(async move {
            let result = photo.await;
            drop(guard);
            match &result {
                Ok(item) => info!(asset = %item.asset().id(), "Capture finished"),
                Err(e) => warn!(error = %e, "Capture failed"),
            }
            result
        }))
    }

    /// Take a photo, waiting for it to be delivered
    pub async fn capture(&self, location: Option<Location>) -> Result<MediaItem, CaptureError> {
        self.begin_capture(location)?.await
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.lock().capture)
            .field("min_zoom", &self.min_zoom)
            .field("max_zoom", &self.max_zoom)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{VirtualCamera, VirtualLens};

    fn controller() -> (CaptureController, VirtualCamera) {
        let camera = VirtualCamera::new();
        let controller = CaptureController::new(Arc::new(camera.clone()));
        controller.configure(CameraPosition::Back).unwrap();
        (controller, camera)
    }

    #[test]
    fn test_clamp_zoom_bounds() {
        for scale in [-100.0, -1.0, 0.0, 0.3, 1.0, 2.0, 50.0, f32::MAX, f32::INFINITY] {
            let zoom = clamp_zoom(scale, 1.5, 1.0, 3.0, 16.0);
            assert!((1.0..=3.0).contains(&zoom), "scale {} gave {}", scale, zoom);
        }
        assert_eq!(clamp_zoom(f32::NAN, 1.0, 1.0, 3.0, 16.0), 1.0);
        // Device ceiling below the configured maximum wins
        assert_eq!(clamp_zoom(10.0, 1.0, 1.0, 3.0, 2.0), 2.0);
        // A device ceiling below the minimum never inverts the range
        assert_eq!(clamp_zoom(10.0, 1.0, 1.0, 3.0, 0.5), 1.0);
    }

    #[test]
    fn test_zoom_gesture_anchoring() {
        let (controller, camera) = controller();
        // Repeated events of one gesture scale the same base
        assert_eq!(controller.set_zoom(1.5).unwrap(), 1.5);
        assert_eq!(controller.set_zoom(2.0).unwrap(), 2.0);
        assert_eq!(controller.end_zoom(2.0).unwrap(), 2.0);
        // The next gesture starts from 2.0
        assert_eq!(controller.set_zoom(1.25).unwrap(), 2.5);
        // A gesture abandoned without an end is re-anchored at the next begin
        controller.begin_zoom();
        assert_eq!(controller.set_zoom(1.0).unwrap(), 2.5);
        assert_eq!(controller.end_zoom(0.5).unwrap(), 1.25);
        assert_eq!(camera.log().zoom_factor, Some(1.25));
    }

    #[test]
    fn test_zoom_requires_device() {
        let controller = CaptureController::new(Arc::new(VirtualCamera::unavailable()));
        assert_eq!(
            controller.set_zoom(2.0),
            Err(CaptureError::DeviceUnavailable)
        );
    }

    #[test]
    fn test_cycle_flash_reaches_hardware() {
        let (controller, camera) = controller();
        assert_eq!(controller.cycle_flash(), FlashMode::On);
        assert_eq!(controller.cycle_flash(), FlashMode::Off);
        assert_eq!(controller.cycle_flash(), FlashMode::Auto);
        assert_eq!(camera.log().flash_mode, Some(FlashMode::Auto));
    }

    #[test]
    fn test_switch_camera_missing_target() {
        let camera = VirtualCamera::with_lenses([(CameraPosition::Back, VirtualLens::default())]);
        let controller = CaptureController::new(Arc::new(camera));
        controller.configure(CameraPosition::Back).unwrap();
        assert_eq!(
            controller.switch_camera(),
            Err(CaptureError::DeviceUnavailable)
        );
        assert_eq!(controller.state().position, Some(CameraPosition::Back));
    }

    #[test]
    fn test_switch_camera_resets_zoom() {
        let (controller, _camera) = controller();
        controller.end_zoom(2.5).unwrap();
        assert_eq!(controller.switch_camera(), Ok(CameraPosition::Front));
        let state = controller.state();
        assert_eq!(state.zoom_factor, MIN_ZOOM_FACTOR);
        assert_eq!(state.zoom_base, MIN_ZOOM_FACTOR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_reverts_after_timeout() {
        let (controller, _camera) = controller();
        controller.focus_at(FocusPoint::new(0.2, 0.8)).unwrap();
        assert_eq!(controller.phase(), CapturePhase::Focusing);

        tokio::time::sleep(Duration::from_millis(600)).await;
        // A second request restarts the timer
        controller.focus_at(FocusPoint::new(0.5, 0.5)).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(controller.phase(), CapturePhase::Focusing);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.phase(), CapturePhase::Idle);
        assert_eq!(
            controller.state().focus_point,
            Some(FocusPoint::new(0.5, 0.5))
        );
    }

    #[tokio::test]
    async fn test_second_capture_rejected_while_in_flight() {
        let (controller, _camera) = controller();
        let first = controller.begin_capture(None).unwrap();
        let before = controller.state();
        assert!(before.is_capturing);

        assert!(matches!(
            controller.begin_capture(None),
            Err(CaptureError::AlreadyCapturing)
        ));
        assert_eq!(controller.state(), before);

        first.await.unwrap();
        assert_eq!(controller.phase(), CapturePhase::Idle);
    }

    #[tokio::test]
    async fn test_switch_camera_rejected_while_capturing() {
        let camera = VirtualCamera::new().with_latency(Duration::from_millis(10));
        let controller = CaptureController::new(Arc::new(camera.clone()));
        controller.configure(CameraPosition::Back).unwrap();

        let pending = controller.begin_capture(None).unwrap();
        assert_eq!(
            controller.switch_camera(),
            Err(CaptureError::AlreadyCapturing)
        );
        assert_eq!(controller.state().position, Some(CameraPosition::Back));
        assert_eq!(camera.log().configured, Some(CameraPosition::Back));

        pending.await.unwrap();
        assert_eq!(controller.switch_camera(), Ok(CameraPosition::Front));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_focus_timeout() {
        let camera = VirtualCamera::new();
        let controller = CaptureController::new(Arc::new(camera))
            .with_focus_timeout(Duration::from_millis(250));
        controller.configure(CameraPosition::Back).unwrap();

        controller.focus_at(FocusPoint::new(0.4, 0.4)).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(controller.phase(), CapturePhase::Focusing);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(controller.phase(), CapturePhase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_capture_clears_flag() {
        let (controller, _camera) = controller();
        let pending = controller.begin_capture(None).unwrap();
        drop(pending);
        assert!(!controller.is_capturing());
    }

    #[tokio::test]
    async fn test_capture_needs_configured_device() {
        let controller = CaptureController::new(Arc::new(VirtualCamera::new()));
        assert_eq!(
            controller.capture(None).await.unwrap_err(),
            CaptureError::DeviceUnavailable
        );
    }
}
