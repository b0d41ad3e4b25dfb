// SPDX-License-Identifier: GPL-3.0-only

//! In-memory photo library
//!
//! Holds asset references with optional decoded images. Assets inserted
//! without an image behave like cloud items that cannot be downloaded: they
//! are listed but resolve to `None`.

use super::{AssetFilter, MediaCatalog, MediaResolver, scale_to_fill};
use crate::media::{AssetId, AssetRef, MediaItem, QualityTier, Size};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use image::DynamicImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct LibraryState {
    assets: Vec<AssetRef>,
    images: HashMap<AssetId, Arc<DynamicImage>>,
}

/// Shared in-memory library; clones refer to the same storage
#[derive(Clone, Default)]
pub struct MemoryLibrary {
    state: Arc<Mutex<LibraryState>>,
    latency: Duration,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch and resolve by `latency` (simulates slow storage)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn state(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an asset; `image` is what it resolves to
    pub fn insert(&self, asset: AssetRef, image: Option<DynamicImage>) {
        let mut state = self.state();
        if let Some(image) = image {
            state.images.insert(asset.id().clone(), Arc::new(image));
        } else {
            state.images.remove(asset.id());
        }
        state.assets.retain(|existing| existing != &asset);
        state.assets.push(asset);
    }

    /// Make an asset undecodable, as if access to it was revoked
    pub fn revoke(&self, id: &AssetId) {
        self.state().images.remove(id);
    }

    pub fn len(&self) -> usize {
        self.state().assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MemoryLibrary")
            .field("assets", &state.assets.len())
            .field("decodable", &state.images.len())
            .field("latency", &self.latency)
            .finish()
    }
}

impl MediaCatalog for MemoryLibrary {
    fn fetch(&self, filter: AssetFilter) -> BoxStream<'static, AssetRef> {
        let mut assets: Vec<AssetRef> = self
            .state()
            .assets
            .iter()
            .filter(|asset| filter.accepts(asset))
            .cloned()
            .collect();
        assets.sort_by_key(|asset| asset.created_at());
        let latency = self.latency;

        Box::pin(async_stream::stream! {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            debug!(count = assets.len(), "Memory library fetch");
            for asset in assets {
                yield asset;
            }
        })
    }
}

impl MediaResolver for MemoryLibrary {
    fn resolve(
        &self,
        asset: &AssetRef,
        target: Size,
        quality: QualityTier,
    ) -> BoxFuture<'static, Option<MediaItem>> {
        let asset = asset.clone();
        let latency = self.latency;
        let library = self.clone();

        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            // Looked up after the delay so a revoke during the wait is honoured
            let image = library.state().images.get(asset.id()).cloned()?;
            let scaled = scale_to_fill(&image, target, quality);
            Some(MediaItem::new(asset, scaled))
        })
    }
}
