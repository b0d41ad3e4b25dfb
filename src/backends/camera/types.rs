// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the camera hardware seam

//! Shared types for camera backends

use serde::{Deserialize, Serialize};

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
}

impl CameraPosition {
    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            CameraPosition::Back => CameraPosition::Front,
            CameraPosition::Front => CameraPosition::Back,
        }
    }

    pub fn from_front(use_front_camera: bool) -> Self {
        if use_front_camera {
            CameraPosition::Front
        } else {
            CameraPosition::Back
        }
    }
}

impl std::fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraPosition::Back => write!(f, "back"),
            CameraPosition::Front => write!(f, "front"),
        }
    }
}

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Camera decides per shot
    #[default]
    Auto,
    /// Flash fires on every shot
    On,
    /// Flash never fires
    Off,
}

impl FlashMode {
    /// Cycle to the next mode: Auto -> On -> Off -> Auto
    pub fn next(self) -> Self {
        match self {
            FlashMode::Auto => FlashMode::On,
            FlashMode::On => FlashMode::Off,
            FlashMode::Off => FlashMode::Auto,
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            FlashMode::Auto => "AUTO",
            FlashMode::On => "ON",
            FlashMode::Off => "OFF",
        }
    }
}

/// Point of interest in normalized preview coordinates
///
/// Both axes are clamped to `[0, 1]` with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    x: f32,
    y: f32,
}

impl FocusPoint {
    pub fn new(x: f32, y: f32) -> Self {
        let clamp = |v: f32| if v.is_nan() { 0.5 } else { v.clamp(0.0, 1.0) };
        Self {
            x: clamp(x),
            y: clamp(y),
        }
    }

    /// Normalize a point given in view coordinates against the view size
    pub fn from_view(x: f32, y: f32, view_width: f32, view_height: f32) -> Self {
        if view_width <= 0.0 || view_height <= 0.0 {
            return Self::new(0.5, 0.5);
        }
        Self::new(x / view_width, y / view_height)
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

/// Geographic location attached to captures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}
