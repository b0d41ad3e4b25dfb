// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for picker operations
//!
//! This module provides command-line functionality for:
//! - Listing the media of a directory the way the picker grid shows it
//! - Running a scripted picker session and saving the picked images

use chrono::Local;
use futures::StreamExt;
use media_picker::backends::camera::VirtualCamera;
use media_picker::backends::library::{AssetFilter, DirectoryLibrary, MediaCatalog, MemoryLibrary};
use media_picker::{
    AssetRef, AuthorizationStatus, HostEvent, MediaItem, Message, PickerCoordinator,
    SelectionEvent, SessionConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

/// List the directory's media, newest first
pub fn list_assets(dir: PathBuf, include_video: bool) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let library = DirectoryLibrary::new(&dir);
    let mut assets: Vec<AssetRef> =
        rt.block_on(library.fetch(AssetFilter { include_video }).collect());
    assets.reverse();

    if assets.is_empty() {
        println!("No media found in {}.", dir.display());
        return Ok(());
    }

    println!("Media in {}:", dir.display());
    println!();
    for (index, asset) in assets.iter().enumerate() {
        let created = asset.created_at().with_timezone(&Local);
        match asset.duration() {
            Some(duration) => println!(
                "  [{}] {} {} ({:.1}s) {}",
                index,
                asset.kind(),
                created.format("%Y-%m-%d %H:%M:%S"),
                duration.as_secs_f32(),
                asset.id()
            ),
            None => println!(
                "  [{}] {} {} {}",
                index,
                asset.kind(),
                created.format("%Y-%m-%d %H:%M:%S"),
                asset.id()
            ),
        }
    }

    Ok(())
}

/// Run a scripted session: tap `select` grid indices, press the shutter
/// `shutter` times, press Done and save what was picked
pub fn pick(
    dir: PathBuf,
    config: Option<PathBuf>,
    select: Vec<usize>,
    shutter: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => SessionConfig::from_json_file(&path)?,
        None => SessionConfig::default(),
    };

    let output_dir = output.unwrap_or_else(get_default_output_dir);
    std::fs::create_dir_all(&output_dir)?;

    let rt = tokio::runtime::Runtime::new()?;
    let items = rt.block_on(async {
        let library = import_directory(&dir).await;
        println!("Loaded {} assets from {}", library.len(), dir.display());
        run_session(config, library, &select, shutter).await
    });

    let Some(items) = items else {
        println!("Picker cancelled.");
        return Ok(());
    };

    if items.is_empty() {
        println!("Nothing picked.");
        return Ok(());
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    for (index, item) in items.iter().enumerate() {
        let path = output_dir.join(format!("pick_{}_{:02}.png", timestamp, index));
        item.image().save(&path)?;
        println!("Saved {} ({}): {}", item.asset().id(), item.size(), path.display());
    }

    Ok(())
}

/// Copy a directory's media into an in-memory library the virtual camera
/// can also save into
async fn import_directory(dir: &Path) -> MemoryLibrary {
    let directory = DirectoryLibrary::new(dir);
    let assets: Vec<AssetRef> = directory
        .fetch(AssetFilter {
            include_video: true,
        })
        .collect()
        .await;

    let library = MemoryLibrary::new();
    for asset in assets {
        let image = if asset.kind().is_video() {
            None
        } else {
            let path = PathBuf::from(asset.id().as_str());
            match tokio::task::spawn_blocking(move || image::open(path)).await {
                Ok(Ok(image)) => Some(image),
                Ok(Err(e)) => {
                    warn!(asset = %asset.id(), error = %e, "Failed to decode");
                    None
                }
                Err(e) => {
                    warn!(asset = %asset.id(), error = %e, "Decode task failed");
                    None
                }
            }
        };
        library.insert(asset, image);
    }
    library
}

async fn run_session(
    config: SessionConfig,
    library: MemoryLibrary,
    select: &[usize],
    shutter: usize,
) -> Option<Vec<MediaItem>> {
    let camera = VirtualCamera::new().saving_to(library.clone());
    let library = Arc::new(library);
    let (picker, mut events) =
        PickerCoordinator::new(config, library.clone(), library, Arc::new(camera));
    let mut picker = picker.with_authorization(AuthorizationStatus::Authorized);

    picker.start();
    picker.settle().await;
    if let Some(outcome) = report(&mut events) {
        return outcome;
    }

    let grid = picker.assets().to_vec();
    for &index in select {
        match grid.get(index) {
            Some(asset) => picker.update(Message::AssetTapped(asset.clone())),
            None => warn!(index, count = grid.len(), "Grid index out of range"),
        }
        picker.settle().await;
    }

    for _ in 0..shutter {
        picker.update(Message::ShutterPressed);
        picker.settle().await;
    }

    picker.update(Message::DonePressed);
    picker.settle().await;
    report(&mut events).unwrap_or(None)
}

/// Print pending host events; `Some` once the session has ended
fn report(events: &mut UnboundedReceiver<HostEvent>) -> Option<Option<Vec<MediaItem>>> {
    let mut outcome = None;
    while let Ok(event) = events.try_recv() {
        match event {
            HostEvent::Selection(SelectionEvent::Pushed(asset)) => {
                println!("Selected {}", asset.id())
            }
            HostEvent::Selection(SelectionEvent::Dropped(asset)) => {
                println!("Deselected {}", asset.id())
            }
            HostEvent::AssetUnresolvable(asset) => println!("Cannot select {}", asset.id()),
            HostEvent::AssetAdded(asset) => println!("Captured {}", asset.id()),
            HostEvent::CaptureFailed(e) => println!("Capture failed: {}", e),
            HostEvent::CameraUnavailable => println!("Camera unavailable"),
            HostEvent::PermissionRequired => println!("Library access denied"),
            HostEvent::Picked(items) => outcome = Some(Some(items)),
            HostEvent::Cancelled => outcome = Some(None),
            other => debug!(event = ?other, "Host event"),
        }
    }
    outcome
}

/// Get default output directory for picked images
fn get_default_output_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("picker")
}
