// SPDX-License-Identifier: GPL-3.0-only

//! Asset references and resolved media

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Opaque, unique identifier of a library item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for newly captured media
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of library item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Photo,
    Video,
    Gif,
}

impl AssetKind {
    /// Whether this kind is only listed when video selection is allowed
    pub fn is_video(&self) -> bool {
        matches!(self, AssetKind::Video)
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Photo => write!(f, "photo"),
            AssetKind::Video => write!(f, "video"),
            AssetKind::Gif => write!(f, "gif"),
        }
    }
}

/// Reference to a library item
///
/// Immutable once created. Equality and hashing only look at the id, so two
/// references to the same item compare equal even if their metadata was read
/// at different times.
#[derive(Debug, Clone)]
pub struct AssetRef {
    id: AssetId,
    kind: AssetKind,
    duration: Option<Duration>,
    created_at: DateTime<Utc>,
}

impl AssetRef {
    /// A still photo
    pub fn photo(id: impl Into<AssetId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Photo,
            duration: None,
            created_at,
        }
    }

    /// A video clip of the given length
    pub fn video(id: impl Into<AssetId>, duration: Duration, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Video,
            duration: Some(duration),
            created_at,
        }
    }

    /// An animated image of the given loop length
    pub fn gif(id: impl Into<AssetId>, duration: Duration, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind: AssetKind::Gif,
            duration: Some(duration),
            created_at,
        }
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Playback length; present for videos and gifs only
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl PartialEq for AssetRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AssetRef {}

impl Hash for AssetRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)
    }
}

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolver quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Cheapest decode that yields something displayable
    Fast,
    /// Full quality decode
    #[default]
    High,
}

/// An asset resolved to decoded pixels
///
/// Owned by whoever requested the resolution. Cloning copies the pixels.
#[derive(Clone)]
pub struct MediaItem {
    asset: AssetRef,
    image: DynamicImage,
}

impl MediaItem {
    pub fn new(asset: AssetRef, image: DynamicImage) -> Self {
        Self { asset, image }
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl std::fmt::Debug for MediaItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaItem")
            .field("asset", &self.asset)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_equality_is_by_id() {
        let now = Utc::now();
        let a = AssetRef::photo("same", now);
        let b = AssetRef::video("same", Duration::from_secs(3), now);
        let c = AssetRef::photo("other", now);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_duration_only_for_timed_kinds() {
        let now = Utc::now();
        assert!(AssetRef::photo("p", now).duration().is_none());
        assert_eq!(
            AssetRef::gif("g", Duration::from_millis(800), now).duration(),
            Some(Duration::from_millis(800))
        );
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(AssetId::generate(), AssetId::generate());
    }

    #[test]
    fn test_media_item_size() {
        let item = MediaItem::new(
            AssetRef::photo("p", Utc::now()),
            DynamicImage::new_rgba8(32, 16),
        );
        assert_eq!(item.size(), Size::new(32, 16));
    }
}
