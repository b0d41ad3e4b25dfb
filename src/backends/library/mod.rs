// SPDX-License-Identifier: GPL-3.0-only

//! Photo library abstraction
//!
//! The picker never touches the host's media store directly. It goes through
//! two read-only seams:
//!
//! ```text
//! ┌──────────────────┐   fetch(filter)    ┌──────────────┐
//! │ PickerCoordinator│ ─────────────────▶ │ MediaCatalog │  → stream of AssetRef
//! │                  │   resolve(asset)   ├──────────────┤
//! │                  │ ─────────────────▶ │ MediaResolver│  → Option<MediaItem>
//! └──────────────────┘                    └──────────────┘
//! ```
//!
//! Both return `'static` futures/streams so the coordinator can hand them to a
//! worker task and receive the result back as a message.

pub mod directory;
pub mod memory;

pub use directory::DirectoryLibrary;
pub use memory::MemoryLibrary;

use crate::media::{AssetRef, MediaItem, QualityTier, Size};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use image::DynamicImage;
use image::imageops::FilterType;

/// Which assets a catalog fetch should yield
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetFilter {
    /// Include video assets (photos and gifs are always included)
    pub include_video: bool,
}

impl AssetFilter {
    pub fn accepts(&self, asset: &AssetRef) -> bool {
        self.include_video || !asset.kind().is_video()
    }
}

/// Read-only source of library assets
pub trait MediaCatalog: Send + Sync {
    /// Stream every asset matching `filter`, ordered by creation time ascending
    fn fetch(&self, filter: AssetFilter) -> BoxStream<'static, AssetRef>;
}

/// Resolves asset references to decoded pixels
pub trait MediaResolver: Send + Sync {
    /// Decode `asset` scaled to fill `target`
    ///
    /// `None` means the asset cannot be decoded (missing, unsupported or
    /// no longer accessible).
    fn resolve(
        &self,
        asset: &AssetRef,
        target: Size,
        quality: QualityTier,
    ) -> BoxFuture<'static, Option<MediaItem>>;
}

/// Scale an image to fill `target`, cropping the overflow
///
/// `Fast` uses nearest-neighbour sampling, `High` uses Lanczos3.
pub fn scale_to_fill(image: &DynamicImage, target: Size, quality: QualityTier) -> DynamicImage {
    let filter = match quality {
        QualityTier::Fast => FilterType::Nearest,
        QualityTier::High => FilterType::Lanczos3,
    };
    image.resize_to_fill(target.width.max(1), target.height.max(1), filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_filter_excludes_video_only() {
        let now = Utc::now();
        let filter = AssetFilter::default();
        assert!(filter.accepts(&AssetRef::photo("p", now)));
        assert!(filter.accepts(&AssetRef::gif("g", Duration::from_secs(1), now)));
        assert!(!filter.accepts(&AssetRef::video("v", Duration::from_secs(1), now)));

        let with_video = AssetFilter {
            include_video: true,
        };
        assert!(with_video.accepts(&AssetRef::video("v", Duration::from_secs(1), now)));
    }

    #[test]
    fn test_scale_to_fill_exact_size() {
        let source = DynamicImage::new_rgb8(400, 300);
        for quality in [QualityTier::Fast, QualityTier::High] {
            let scaled = scale_to_fill(&source, Size::new(100, 100), quality);
            assert_eq!((scaled.width(), scaled.height()), (100, 100));
        }
    }
}
