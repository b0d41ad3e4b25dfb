// SPDX-License-Identifier: GPL-3.0-only

//! Session configuration
//!
//! A [`SessionConfig`] is a read-only snapshot taken when a picker session
//! starts. Changing any option means starting a new session.

use crate::constants::DEFAULT_OUTPUT_SIZE;
use crate::errors::{PickerError, PickerResult};
use crate::media::{QualityTier, Size};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which media sources the session exposes
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Only the camera
    Camera,
    /// Only the photo library
    Library,
    /// Camera and photo library
    #[default]
    Both,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of selected assets (0 = unbounded)
    pub capacity_limit: usize,
    /// Multi-select; when false a new selection replaces the previous one
    pub allow_multi_select: bool,
    /// List videos alongside photos
    pub allow_video: bool,
    /// Camera, library or both
    pub source_mode: SourceMode,
    /// Quality tier for the decodability probe run on tap
    pub preview_quality: QualityTier,
    /// Size of the final picked images (None = default output size)
    pub output_size: Option<Size>,
    /// Open the front camera first
    pub start_on_front_camera: bool,
    /// Allow switching between front and back cameras
    pub can_rotate_camera: bool,
    /// Attach the last known location to captured photos
    pub record_location: bool,
    /// Honour pinch-to-zoom gestures
    pub allow_pinch_to_zoom: bool,
    /// Treat a hardware volume button press as the shutter
    pub allow_volume_shutter: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity_limit: 0,
            allow_multi_select: true,
            allow_video: false,
            source_mode: SourceMode::default(),
            preview_quality: QualityTier::High,
            output_size: None,
            start_on_front_camera: false,
            can_rotate_camera: true,
            record_location: true,
            allow_pinch_to_zoom: true,
            allow_volume_shutter: true,
        }
    }
}

impl SessionConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json_str(json: &str) -> PickerResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: &Path) -> PickerResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> PickerResult<()> {
        if let Some(size) = self.output_size
            && (size.width == 0 || size.height == 0)
        {
            return Err(PickerError::Config(format!(
                "output_size must be non-zero, got {}",
                size
            )));
        }
        Ok(())
    }

    /// Output size for picked images
    pub fn output_size_or_default(&self) -> Size {
        self.output_size.unwrap_or(DEFAULT_OUTPUT_SIZE)
    }

    pub fn uses_camera(&self) -> bool {
        matches!(self.source_mode, SourceMode::Camera | SourceMode::Both)
    }

    pub fn uses_library(&self) -> bool {
        matches!(self.source_mode, SourceMode::Library | SourceMode::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SessionConfig::from_json_str(r#"{ "capacity_limit": 4, "source_mode": "library" }"#)
                .unwrap();
        assert_eq!(config.capacity_limit, 4);
        assert_eq!(config.source_mode, SourceMode::Library);
        assert!(config.allow_multi_select);
        assert!(!config.uses_camera());
        assert!(config.uses_library());
    }

    #[test]
    fn test_zero_output_size_is_rejected() {
        let err = SessionConfig::from_json_str(r#"{ "output_size": { "width": 0, "height": 10 } }"#)
            .unwrap_err();
        assert!(matches!(err, PickerError::Config(_)));
    }

    #[test]
    fn test_output_size_fallback() {
        let mut config = SessionConfig::default();
        assert_eq!(config.output_size_or_default(), DEFAULT_OUTPUT_SIZE);
        config.output_size = Some(Size::new(300, 200));
        assert_eq!(config.output_size_or_default(), Size::new(300, 200));
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            SessionConfig::from_json_str("{ nope"),
            Err(PickerError::Config(_))
        ));
    }
}
