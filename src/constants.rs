// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use crate::media::Size;
use std::time::Duration;

/// Lowest zoom factor the picker will request from the camera
pub const MIN_ZOOM_FACTOR: f32 = 1.0;

/// Highest zoom factor the picker will request, further capped by the device
pub const MAX_ZOOM_FACTOR: f32 = 3.0;

/// How long a tap-to-focus indicator stays up before reverting to idle
pub const FOCUS_REVERT_TIMEOUT: Duration = Duration::from_secs(1);

/// Size of the decodability probe run before a tapped asset is selected
pub const TAP_PREVIEW_SIZE: Size = Size::new(100, 100);

/// Output size used when the session has no preferred output size
pub const DEFAULT_OUTPUT_SIZE: Size = Size::new(720, 1280);

/// File extensions recognised by the directory library
pub mod extensions {
    /// Still images
    pub const PHOTO: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];
    /// Animated images
    pub const GIF: &[&str] = &["gif"];
    /// Movies
    pub const VIDEO: &[&str] = &["mp4", "mov", "m4v"];
}
