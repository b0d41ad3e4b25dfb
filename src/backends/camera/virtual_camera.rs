// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera device
//!
//! Renders a gradient test pattern instead of reading a sensor. Useful for the
//! command line front end and for exercising the capture state machine
//! without hardware. Every control call is recorded so callers can inspect
//! what reached the "device".

use super::{CameraHardware, CameraPosition, FlashMode, FocusPoint, Location};
use crate::backends::library::MemoryLibrary;
use crate::errors::CaptureError;
use crate::media::{AssetId, AssetRef, MediaItem, Size};
use chrono::Utc;
use futures::future::BoxFuture;
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Static description of one camera on the virtual device
#[derive(Debug, Clone, Copy)]
pub struct VirtualLens {
    pub has_flash: bool,
    pub max_zoom_factor: f32,
}

impl Default for VirtualLens {
    fn default() -> Self {
        Self {
            has_flash: true,
            max_zoom_factor: 16.0,
        }
    }
}

/// Everything the device has been told so far
#[derive(Debug, Clone, Default)]
pub struct VirtualCameraLog {
    pub configured: Option<CameraPosition>,
    pub flash_mode: Option<FlashMode>,
    pub zoom_factor: Option<f32>,
    pub focus: Option<FocusPoint>,
    pub captures: usize,
    pub last_location: Option<Location>,
}

struct DeviceState {
    lenses: HashMap<CameraPosition, VirtualLens>,
    log: VirtualCameraLog,
    fail_next_capture: bool,
}

/// Synthetic camera implementing [`CameraHardware`]
#[derive(Clone)]
pub struct VirtualCamera {
    state: Arc<Mutex<DeviceState>>,
    frame_size: Size,
    latency: Duration,
    library: Option<MemoryLibrary>,
}

impl VirtualCamera {
    /// Device with a back camera and a front camera, both with flash
    pub fn new() -> Self {
        Self::with_lenses([
            (CameraPosition::Back, VirtualLens::default()),
            (
                CameraPosition::Front,
                VirtualLens {
                    has_flash: false,
                    max_zoom_factor: 4.0,
                },
            ),
        ])
    }

    /// Device exposing only the given cameras
    pub fn with_lenses(lenses: impl IntoIterator<Item = (CameraPosition, VirtualLens)>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                lenses: lenses.into_iter().collect(),
                log: VirtualCameraLog::default(),
                fail_next_capture: false,
            })),
            frame_size: Size::new(640, 480),
            latency: Duration::ZERO,
            library: None,
        }
    }

    /// Device without any camera
    pub fn unavailable() -> Self {
        Self::with_lenses([])
    }

    /// Size of captured frames
    pub fn with_frame_size(mut self, size: Size) -> Self {
        self.frame_size = size;
        self
    }

    /// Time between shutter and delivered photo
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Save captured photos into `library`
    pub fn saving_to(mut self, library: MemoryLibrary) -> Self {
        self.library = Some(library);
        self
    }

    /// Make the next capture fail as if the frame could not be decoded
    pub fn fail_next_capture(&self) {
        self.state().fail_next_capture = true;
    }

    /// Snapshot of the calls received so far
    pub fn log(&self) -> VirtualCameraLog {
        self.state().log.clone()
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_lens(&self) -> Option<VirtualLens> {
        let state = self.state();
        state
            .log
            .configured
            .and_then(|position| state.lenses.get(&position).copied())
    }
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VirtualCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("VirtualCamera")
            .field("lenses", &state.lenses.len())
            .field("configured", &state.log.configured)
            .field("frame_size", &self.frame_size)
            .finish()
    }
}

/// Diagonal gradient tinted differently per camera
fn render_test_pattern(size: Size, position: CameraPosition, shot: usize) -> DynamicImage {
    let width = size.width.max(1);
    let height = size.height.max(1);
    let tint = match position {
        CameraPosition::Back => 0u8,
        CameraPosition::Front => 128u8,
    };
    let offset = (shot % 256) as u32;

    let frame = RgbImage::from_fn(width, height, |x, y| {
        let r = ((x * 255) / width) as u8;
        let g = ((y * 255) / height) as u8;
        let b = (((x + y + offset) % 256) as u8).wrapping_add(tint);
        Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(frame)
}

impl CameraHardware for VirtualCamera {
    fn configure(&self, position: CameraPosition) -> Result<(), CaptureError> {
        let mut state = self.state();
        if !state.lenses.contains_key(&position) {
            debug!(%position, "Virtual camera has no such lens");
            return Err(CaptureError::DeviceUnavailable);
        }
        info!(%position, "Virtual camera configured");
        state.log.configured = Some(position);
        state.log.zoom_factor = None;
        Ok(())
    }

    fn is_available(&self, position: CameraPosition) -> bool {
        self.state().lenses.contains_key(&position)
    }

    fn has_flash(&self) -> bool {
        self.active_lens().is_some_and(|lens| lens.has_flash)
    }

    fn max_zoom_factor(&self) -> f32 {
        self.active_lens()
            .map(|lens| lens.max_zoom_factor)
            .unwrap_or(1.0)
    }

    fn set_flash_mode(&self, mode: FlashMode) {
        self.state().log.flash_mode = Some(mode);
    }

    fn set_zoom_factor(&self, factor: f32) {
        self.state().log.zoom_factor = Some(factor);
    }

    fn focus(&self, point: FocusPoint) {
        self.state().log.focus = Some(point);
    }

    fn capture_photo(
        &self,
        location: Option<Location>,
    ) -> BoxFuture<'static, Result<MediaItem, CaptureError>> {
        let camera = self.clone();

        Box::pin(async move {
            if !camera.latency.is_zero() {
                tokio::time::sleep(camera.latency).await;
            }

            let (position, shot) = {
                let mut state = camera.state();
                let position = state
                    .log
                    .configured
                    .ok_or(CaptureError::DeviceUnavailable)?;
                if std::mem::take(&mut state.fail_next_capture) {
                    return Err(CaptureError::Unresolvable);
                }
                state.log.captures += 1;
                state.log.last_location = location;
                (position, state.log.captures)
            };

            let image = render_test_pattern(camera.frame_size, position, shot);
            let asset = AssetRef::photo(AssetId::generate(), Utc::now());
            if let Some(library) = &camera.library {
                library.insert(asset.clone(), Some(image.clone()));
            }
            debug!(asset = %asset.id(), %position, "Virtual camera captured frame");

            Ok(MediaItem::new(asset, image))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_missing_lens() {
        let camera = VirtualCamera::with_lenses([(CameraPosition::Back, VirtualLens::default())]);
        assert_eq!(
            camera.configure(CameraPosition::Front),
            Err(CaptureError::DeviceUnavailable)
        );
        assert!(camera.configure(CameraPosition::Back).is_ok());
        assert!(camera.has_flash());
    }

    #[test]
    fn test_capabilities_follow_active_lens() {
        let camera = VirtualCamera::new();
        assert_eq!(camera.max_zoom_factor(), 1.0);
        camera.configure(CameraPosition::Front).unwrap();
        assert!(!camera.has_flash());
        assert_eq!(camera.max_zoom_factor(), 4.0);
    }

    #[tokio::test]
    async fn test_capture_requires_configuration() {
        let camera = VirtualCamera::new();
        assert_eq!(
            camera.capture_photo(None).await.unwrap_err(),
            CaptureError::DeviceUnavailable
        );
    }

    #[tokio::test]
    async fn test_capture_saves_to_library() {
        let library = MemoryLibrary::new();
        let camera = VirtualCamera::new()
            .with_frame_size(Size::new(8, 6))
            .saving_to(library.clone());
        camera.configure(CameraPosition::Back).unwrap();

        let location = Location {
            latitude: 48.1,
            longitude: 11.5,
        };
        let item = camera.capture_photo(Some(location)).await.unwrap();
        assert_eq!(item.size(), Size::new(8, 6));
        assert_eq!(library.len(), 1);
        assert_eq!(camera.log().last_location, Some(location));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let camera = VirtualCamera::new();
        camera.configure(CameraPosition::Back).unwrap();
        camera.fail_next_capture();
        assert_eq!(
            camera.capture_photo(None).await.unwrap_err(),
            CaptureError::Unresolvable
        );
        assert!(camera.capture_photo(None).await.is_ok());
    }
}
