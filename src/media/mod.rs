// SPDX-License-Identifier: GPL-3.0-only

//! Media data model shared by the library, camera and picker layers
//!
//! # Types
//!
//! - [`AssetRef`]: identifier plus metadata for a library item, never pixels
//! - [`MediaItem`]: an [`AssetRef`] resolved to decoded image data
//! - [`Size`] and [`QualityTier`]: resolution requests for the resolver

pub mod types;

pub use types::{AssetId, AssetKind, AssetRef, MediaItem, QualityTier, Size};
