// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem-backed photo library
//!
//! Lists the media files of a single directory (non-recursive). Scanning and
//! decoding both run on tokio's blocking pool so the coordinator's task is
//! never stalled by disk or codec work.

use super::{AssetFilter, MediaCatalog, MediaResolver, scale_to_fill};
use crate::constants::extensions;
use crate::media::{AssetKind, AssetRef, MediaItem, QualityTier, Size};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Photo library rooted at a directory
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Classify a path by its extension
fn kind_for_path(path: &Path) -> Option<AssetKind> {
    let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
    if extensions::PHOTO.contains(&ext.as_str()) {
        Some(AssetKind::Photo)
    } else if extensions::GIF.contains(&ext.as_str()) {
        Some(AssetKind::Gif)
    } else if extensions::VIDEO.contains(&ext.as_str()) {
        Some(AssetKind::Video)
    } else {
        None
    }
}

/// Total loop length of an animated gif
fn gif_duration(path: &Path) -> Duration {
    let total = std::fs::File::open(path)
        .ok()
        .and_then(|file| GifDecoder::new(BufReader::new(file)).ok())
        .map(|decoder| {
            decoder
                .into_frames()
                .filter_map(Result::ok)
                .map(|frame| Duration::from(frame.delay()))
                .sum::<Duration>()
        });

    total.unwrap_or_default()
}

fn asset_for_entry(path: &Path, kind: AssetKind) -> Option<AssetRef> {
    let metadata = std::fs::metadata(path).ok()?;
    let created: DateTime<Utc> = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());
    let id = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned();

    Some(match kind {
        AssetKind::Photo => AssetRef::photo(id, created),
        AssetKind::Gif => AssetRef::gif(id, gif_duration(path), created),
        // Clip length is not probed; listing only needs the kind
        AssetKind::Video => AssetRef::video(id, Duration::ZERO, created),
    })
}

/// Scan `root` for media files accepted by `filter`, oldest first
fn scan(root: &Path, filter: AssetFilter) -> Vec<AssetRef> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %root.display(), error = %e, "Cannot read library directory");
            return Vec::new();
        }
    };

    let mut assets: Vec<AssetRef> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let kind = kind_for_path(&path)?;
            asset_for_entry(&path, kind)
        })
        .filter(|asset| filter.accepts(asset))
        .collect();

    assets.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    assets
}

impl MediaCatalog for DirectoryLibrary {
    fn fetch(&self, filter: AssetFilter) -> BoxStream<'static, AssetRef> {
        let root = self.root.clone();

        Box::pin(async_stream::stream! {
            let scan_root = root.clone();
            let assets = match tokio::task::spawn_blocking(move || scan(&scan_root, filter)).await {
                Ok(assets) => assets,
                Err(e) => {
                    warn!(path = %root.display(), error = %e, "Library scan task failed");
                    Vec::new()
                }
            };
            debug!(path = %root.display(), count = assets.len(), "Scanned library directory");
            for asset in assets {
                yield asset;
            }
        })
    }
}

impl MediaResolver for DirectoryLibrary {
    fn resolve(
        &self,
        asset: &AssetRef,
        target: Size,
        quality: QualityTier,
    ) -> BoxFuture<'static, Option<MediaItem>> {
        let asset = asset.clone();

        Box::pin(async move {
            if asset.kind().is_video() {
                debug!(asset = %asset.id(), "Video assets have no still image decoder");
                return None;
            }

            let path = PathBuf::from(asset.id().as_str());
            let decoded = tokio::task::spawn_blocking(move || {
                let image = image::open(&path)
                    .map_err(|e| {
                        debug!(path = %path.display(), error = %e, "Decode failed");
                    })
                    .ok()?;
                Some(scale_to_fill(&image, target, quality))
            })
            .await
            .ok()??;

            Some(MediaItem::new(asset, decoded))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_path() {
        assert_eq!(kind_for_path(Path::new("a/b.JPG")), Some(AssetKind::Photo));
        assert_eq!(kind_for_path(Path::new("loop.gif")), Some(AssetKind::Gif));
        assert_eq!(kind_for_path(Path::new("clip.mov")), Some(AssetKind::Video));
        assert_eq!(kind_for_path(Path::new("notes.txt")), None);
        assert_eq!(kind_for_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_scan_missing_directory_is_empty() {
        let assets = scan(
            Path::new("/definitely/not/a/picker/library"),
            AssetFilter::default(),
        );
        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn test_scan_and_resolve_written_images() {
        use futures::StreamExt;

        let dir = std::env::temp_dir().join(format!("picker-dir-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        image::DynamicImage::new_rgb8(40, 20)
            .save(dir.join("one.png"))
            .unwrap();
        std::fs::write(dir.join("clip.mp4"), b"not really a movie").unwrap();
        std::fs::write(dir.join("readme.txt"), b"ignored").unwrap();

        let library = DirectoryLibrary::new(&dir);
        let photos: Vec<AssetRef> = library.fetch(AssetFilter::default()).collect().await;
        assert_eq!(photos.len(), 1);

        let everything: Vec<AssetRef> = library
            .fetch(AssetFilter {
                include_video: true,
            })
            .collect()
            .await;
        assert_eq!(everything.len(), 2);

        let item = library
            .resolve(&photos[0], Size::new(10, 10), QualityTier::Fast)
            .await
            .unwrap();
        assert_eq!(item.size(), Size::new(10, 10));

        let video = everything
            .iter()
            .find(|asset| asset.kind() == AssetKind::Video)
            .unwrap();
        assert!(
            library
                .resolve(video, Size::new(10, 10), QualityTier::Fast)
                .await
                .is_none()
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
