// SPDX-License-Identifier: GPL-3.0-only

//! Camera hardware abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  PickerCoordinator  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CaptureController  │  ← State machine, the only caller of the hardware
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraHardware Trait│  ← Adapter over the platform camera session
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │VirtualCamera │  ← Synthetic implementation
//!     └──────────────┘
//! ```

pub mod types;
pub mod virtual_camera;

pub use types::*;
pub use virtual_camera::{VirtualCamera, VirtualCameraLog, VirtualLens};

use crate::errors::CaptureError;
use crate::media::MediaItem;
use futures::future::BoxFuture;

/// Adapter over a single exclusive camera session
///
/// Implementations hold their own interior state; the capture controller
/// serializes every call so implementations never see concurrent requests.
pub trait CameraHardware: Send + Sync {
    // ===== Lifecycle =====

    /// Open the front or back camera, replacing any current input
    ///
    /// # Returns
    /// * `Ok(())` - The camera is ready for capture
    /// * `Err(CaptureError::DeviceUnavailable)` - No such camera
    fn configure(&self, position: CameraPosition) -> Result<(), CaptureError>;

    /// Whether a camera exists at `position`
    fn is_available(&self, position: CameraPosition) -> bool;

    // ===== Capabilities =====

    /// Whether the configured camera has a flash unit
    fn has_flash(&self) -> bool;

    /// Highest zoom factor of the configured camera's active format
    fn max_zoom_factor(&self) -> f32;

    // ===== Controls =====

    fn set_flash_mode(&self, mode: FlashMode);

    fn set_zoom_factor(&self, factor: f32);

    fn focus(&self, point: FocusPoint);

    // ===== Capture =====

    /// Take a photo and store it in the library
    ///
    /// The returned item carries the new library asset and its decoded image.
    fn capture_photo(
        &self,
        location: Option<Location>,
    ) -> BoxFuture<'static, Result<MediaItem, CaptureError>>;
}
