// SPDX-License-Identifier: GPL-3.0-only

//! Picker coordinator
//!
//! Owns the selection stack, the browsable asset list and the capture
//! controller, and sequences user intents against them.
//!
//! # Execution model
//!
//! The coordinator runs on one task. Host intents and worker completions both
//! arrive on the same channel and are handled one at a time by
//! [`PickerCoordinator::update`]. Slow work (catalog fetches, decodes,
//! captures) is spawned onto worker tasks that only produce values; the
//! resulting completion is validated against the state *at the time it
//! arrives*, never against the state at the time it was requested.
//!
//! ```text
//!  host ──Message──▶ ┌───────────────┐ ──spawn──▶ worker (fetch/resolve/capture)
//!                    │  coordinator  │                         │
//!  host ◀─HostEvent─ └───────────────┘ ◀──────Completion───────┘
//! ```

use crate::backends::camera::{CameraHardware, CameraPosition, FlashMode, FocusPoint, Location};
use crate::backends::library::{AssetFilter, MediaCatalog, MediaResolver};
use crate::config::SessionConfig;
use crate::constants::TAP_PREVIEW_SIZE;
use crate::errors::CaptureError;
use crate::media::{AssetId, AssetRef, MediaItem, QualityTier, Size};
use crate::picker::authorization::AuthorizationStatus;
use crate::picker::capture::{CaptureController, CaptureState};
use crate::picker::selection::{SelectMode, SelectionEvent, SelectionStack};
use futures::StreamExt;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Phase of a pinch gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomGesture {
    Began,
    Changed(f32),
    Ended(f32),
}

/// User intents sent by the host
#[derive(Debug, Clone)]
pub enum Message {
    /// The permission layer reported a new status
    AuthorizationChanged(AuthorizationStatus),
    /// A grid cell was tapped
    AssetTapped(AssetRef),
    ShutterPressed,
    /// Hardware volume button; acts as the shutter when enabled
    VolumeButtonPressed,
    FlashPressed,
    RotatePressed,
    FocusRequested(FocusPoint),
    Zoom(ZoomGesture),
    LocationUpdated(Location),
    /// Replace the selection with a host-supplied one
    ResetSelection(Vec<AssetRef>),
    DonePressed,
    CancelPressed,
    /// The selection thumbnail stack was tapped
    StackPressed,
}

/// Label of the done/cancel button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneTitle {
    Cancel,
    Done,
}

/// Notifications for the host UI
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// The browsable list was (re)loaded, newest first
    AssetsLoaded(Vec<AssetRef>),
    /// A captured asset was added at the front of the browsable list
    AssetAdded(AssetRef),
    /// The selection changed
    Selection(SelectionEvent),
    DoneTitleChanged(DoneTitle),
    /// A tapped asset could not be decoded and was not selected
    AssetUnresolvable(AssetRef),
    FlashModeChanged(FlashMode),
    FlashAvailabilityChanged(bool),
    CameraSwitched(CameraPosition),
    ZoomChanged(f32),
    /// Disable the shutter until `CaptureFinished`
    CaptureStarted,
    CaptureFinished,
    CaptureFailed(CaptureError),
    /// Camera features are gone for the rest of the session
    CameraUnavailable,
    /// Library access was denied; ask the user to change it in settings
    PermissionRequired,
    /// Done: the resolved selection
    Picked(Vec<MediaItem>),
    Cancelled,
    /// Stack tapped: the resolved selection, session stays open
    Previewed(Vec<MediaItem>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Picked,
    Previewed,
}

/// Results handed back by worker tasks
enum Completion {
    AssetsFetched {
        generation: u64,
        assets: Vec<AssetRef>,
    },
    PreviewResolved {
        asset: AssetRef,
        item: Option<MediaItem>,
    },
    CaptureFinished(Result<MediaItem, CaptureError>),
    SelectionResolved {
        delivery: Delivery,
        items: Vec<MediaItem>,
    },
}

enum Input {
    Intent(Message),
    Completion(Completion),
}

/// Sends intents to a running coordinator
#[derive(Clone)]
pub struct PickerHandle {
    sender: mpsc::UnboundedSender<Input>,
}

impl PickerHandle {
    /// Queue an intent; returns false once the coordinator is gone
    pub fn send(&self, message: Message) -> bool {
        self.sender.send(Input::Intent(message)).is_ok()
    }
}

impl std::fmt::Debug for PickerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerHandle")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Resolve `assets` in order, skipping the ones that cannot be decoded
async fn resolve_all(
    resolver: Arc<dyn MediaResolver>,
    assets: Vec<AssetRef>,
    size: Size,
) -> Vec<MediaItem> {
    let requests = assets
        .iter()
        .map(|asset| resolver.resolve(asset, size, QualityTier::High));
    let resolved = futures::future::join_all(requests).await;

    assets
        .iter()
        .zip(resolved)
        .filter_map(|(asset, item)| {
            if item.is_none() {
                warn!(asset = %asset.id(), "Selected asset could not be resolved");
            }
            item
        })
        .collect()
}

/// Drives one picker session
///
/// Must be driven inside a tokio runtime.
pub struct PickerCoordinator {
    config: SessionConfig,
    catalog: Arc<dyn MediaCatalog>,
    resolver: Arc<dyn MediaResolver>,
    camera: CaptureController,
    stack: SelectionStack,
    /// Browsable list, newest first
    assets: Vec<AssetRef>,
    authorization: AuthorizationStatus,
    fetch_generation: u64,
    fetch_pending: bool,
    pending_previews: HashSet<AssetId>,
    location: Option<Location>,
    camera_available: bool,
    done_title: DoneTitle,
    /// Done or Cancel accepted; no further mutation
    closing: bool,
    /// Terminal host callback delivered
    finished: bool,
    in_flight: usize,
    host: mpsc::UnboundedSender<HostEvent>,
    sender: mpsc::UnboundedSender<Input>,
    receiver: mpsc::UnboundedReceiver<Input>,
}

impl PickerCoordinator {
    /// Create a session; host events arrive on the returned receiver
    pub fn new(
        config: SessionConfig,
        catalog: Arc<dyn MediaCatalog>,
        resolver: Arc<dyn MediaResolver>,
        hardware: Arc<dyn CameraHardware>,
    ) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (host, host_events) = mpsc::unbounded_channel();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut stack = SelectionStack::from_config(&config);
        let selection_host = host.clone();
        stack.subscribe(move |event| {
            let _ = selection_host.send(HostEvent::Selection(event.clone()));
        });

        let coordinator = Self {
            camera: CaptureController::new(hardware),
            stack,
            config,
            catalog,
            resolver,
            assets: Vec::new(),
            authorization: AuthorizationStatus::Undetermined,
            fetch_generation: 0,
            fetch_pending: false,
            pending_previews: HashSet::new(),
            location: None,
            camera_available: true,
            done_title: DoneTitle::Cancel,
            closing: false,
            finished: false,
            in_flight: 0,
            host,
            sender,
            receiver,
        };
        (coordinator, host_events)
    }

    /// Authorization known before the session starts
    pub fn with_authorization(mut self, status: AuthorizationStatus) -> Self {
        self.authorization = status;
        self
    }

    pub fn handle(&self) -> PickerHandle {
        PickerHandle {
            sender: self.sender.clone(),
        }
    }

    // ===== Accessors =====

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Browsable list, newest first
    pub fn assets(&self) -> &[AssetRef] {
        &self.assets
    }

    pub fn selection(&self) -> Vec<AssetRef> {
        self.stack.snapshot()
    }

    pub fn authorization(&self) -> AuthorizationStatus {
        self.authorization
    }

    pub fn capture_state(&self) -> CaptureState {
        self.camera.state()
    }

    pub fn done_title(&self) -> DoneTitle {
        self.done_title
    }

    pub fn is_camera_available(&self) -> bool {
        self.camera_available
    }

    /// Done or Cancel has been delivered to the host
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Room for one more asset; single-select always has room by replacing
    pub fn is_below_capacity(&self) -> bool {
        self.stack.mode() == SelectMode::Single || self.stack.is_below_capacity()
    }

    // ===== Driving =====

    /// Configure the camera and kick off the initial library load
    ///
    /// The initial fetch also runs while authorization is undetermined so the
    /// grid is ready the moment access is granted; its result is discarded
    /// unless the session is authorized when it arrives.
    pub fn start(&mut self) {
        info!(
            source = ?self.config.source_mode,
            capacity = self.config.capacity_limit,
            multi = self.config.allow_multi_select,
            authorization = %self.authorization,
            "Starting picker session"
        );

        if self.config.uses_camera() {
            let position = CameraPosition::from_front(self.config.start_on_front_camera);
            match self.camera.configure(position) {
                Ok(()) => {
                    self.emit(HostEvent::FlashAvailabilityChanged(self.camera.has_flash()));
                    self.emit(HostEvent::FlashModeChanged(self.camera.state().flash_mode));
                }
                Err(_) => self.mark_camera_unavailable(),
            }
        } else {
            self.camera_available = false;
        }

        self.emit(HostEvent::DoneTitleChanged(self.done_title));

        let status = self.authorization;
        match status {
            AuthorizationStatus::Denied => self.emit(HostEvent::PermissionRequired),
            _ if self.config.uses_library() => self.request_fetch(),
            _ => {}
        }
    }

    /// Handle messages until Done or Cancel has been delivered
    pub async fn run(mut self) -> Self {
        while !self.finished {
            match self.receiver.recv().await {
                Some(input) => self.dispatch(input),
                None => break,
            }
        }
        self
    }

    /// Handle queued intents and wait for all spawned work to complete
    pub async fn settle(&mut self) {
        loop {
            while let Ok(input) = self.receiver.try_recv() {
                self.dispatch(input);
            }
            if self.in_flight == 0 {
                break;
            }
            match self.receiver.recv().await {
                Some(input) => self.dispatch(input),
                None => break,
            }
        }
    }

    fn dispatch(&mut self, input: Input) {
        match input {
            Input::Intent(message) => self.update(message),
            Input::Completion(completion) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.complete(completion);
            }
        }
    }

    fn emit(&self, event: HostEvent) {
        if self.host.send(event).is_err() {
            debug!("Host event receiver dropped");
        }
    }

    fn spawn(&mut self, work: impl Future<Output = Completion> + Send + 'static) {
        self.in_flight += 1;
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let completion = work.await;
            let _ = sender.send(Input::Completion(completion));
        });
    }

    /// Apply a host intent
    pub fn update(&mut self, message: Message) {
        if self.closing {
            debug!(?message, "Session closing, intent ignored");
            return;
        }

        match message {
            Message::AuthorizationChanged(status) => self.on_authorization_changed(status),
            Message::AssetTapped(asset) => self.on_asset_tapped(asset),
            Message::ShutterPressed => self.on_shutter_pressed(),
            Message::VolumeButtonPressed => {
                if self.config.allow_volume_shutter {
                    self.on_shutter_pressed();
                }
            }
            Message::FlashPressed => self.on_flash_pressed(),
            Message::RotatePressed => self.on_rotate_pressed(),
            Message::FocusRequested(point) => {
                if let Err(e) = self.camera.focus_at(point) {
                    debug!(error = %e, "Focus request ignored");
                }
            }
            Message::Zoom(gesture) => self.on_zoom(gesture),
            Message::LocationUpdated(location) => self.location = Some(location),
            Message::ResetSelection(assets) => {
                self.stack.reset(assets);
                self.sync_done_title();
            }
            Message::DonePressed => self.on_done(),
            Message::CancelPressed => self.on_cancel(),
            Message::StackPressed => self.on_stack_pressed(),
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::AssetsFetched { generation, assets } => {
                self.on_assets_fetched(generation, assets)
            }
            Completion::PreviewResolved { asset, item } => self.on_preview_resolved(asset, item),
            Completion::CaptureFinished(result) => self.on_capture_finished(result),
            Completion::SelectionResolved { delivery, items } => {
                self.on_selection_resolved(delivery, items)
            }
        }
    }

    // ===== Library =====

    fn request_fetch(&mut self) {
        self.fetch_generation += 1;
        self.fetch_pending = true;
        let generation = self.fetch_generation;
        let filter = AssetFilter {
            include_video: self.config.allow_video,
        };
        let stream = self.catalog.fetch(filter);
        debug!(generation, "Fetching library");

        self.spawn(async move {
            let assets = stream.collect::<Vec<_>>().await;
            Completion::AssetsFetched { generation, assets }
        });
    }

    fn on_authorization_changed(&mut self, status: AuthorizationStatus) {
        if status == self.authorization {
            return;
        }
        info!(from = %self.authorization, to = %status, "Authorization changed");
        self.authorization = status;

        if !status.is_authorized() {
            // Anything still in flight was requested under a different status
            self.fetch_generation += 1;
            self.fetch_pending = false;
            if !self.assets.is_empty() {
                self.assets.clear();
                self.emit(HostEvent::AssetsLoaded(Vec::new()));
            }
        }

        match status {
            AuthorizationStatus::Authorized => {
                if self.config.uses_library() && !self.fetch_pending {
                    self.request_fetch();
                }
            }
            AuthorizationStatus::Denied => self.emit(HostEvent::PermissionRequired),
            AuthorizationStatus::Undetermined => {}
        }
    }

    fn on_assets_fetched(&mut self, generation: u64, mut assets: Vec<AssetRef>) {
        if generation != self.fetch_generation {
            debug!(
                generation,
                current = self.fetch_generation,
                "Discarding stale library fetch"
            );
            return;
        }
        self.fetch_pending = false;

        if let Err(e) = self.authorization.require() {
            debug!(error = %e, "Discarding library fetch without authorization");
            return;
        }

        assets.reverse();
        info!(count = assets.len(), "Library loaded");
        self.assets = assets;
        self.emit(HostEvent::AssetsLoaded(self.assets.clone()));
    }

    // ===== Selection =====

    fn sync_done_title(&mut self) {
        let title = if self.stack.is_empty() {
            DoneTitle::Cancel
        } else {
            DoneTitle::Done
        };
        if title != self.done_title {
            self.done_title = title;
            self.emit(HostEvent::DoneTitleChanged(title));
        }
    }

    fn on_asset_tapped(&mut self, asset: AssetRef) {
        if let Err(e) = self.authorization.require() {
            debug!(error = %e, "Tap ignored without authorization");
            return;
        }
        if asset.kind().is_video() && !self.config.allow_video {
            debug!(asset = %asset.id(), "Video selection disabled");
            return;
        }

        if self.stack.contains(asset.id()) {
            if self.stack.mode() == SelectMode::Multi {
                if self.stack.drop(&asset).is_ok() {
                    self.sync_done_title();
                }
            } else {
                debug!(asset = %asset.id(), "Already the single selection");
            }
            return;
        }

        if !self.stack.can_accept(&asset) {
            debug!(asset = %asset.id(), "Selection full, tap ignored");
            return;
        }
        if !self.pending_previews.insert(asset.id().clone()) {
            debug!(asset = %asset.id(), "Preview already in flight");
            return;
        }

        let preview = self
            .resolver
            .resolve(&asset, TAP_PREVIEW_SIZE, self.config.preview_quality);
        self.spawn(async move {
            let item = preview.await;
            Completion::PreviewResolved { asset, item }
        });
    }

    fn on_preview_resolved(&mut self, asset: AssetRef, item: Option<MediaItem>) {
        self.pending_previews.remove(asset.id());

        if self.closing {
            debug!(asset = %asset.id(), "Session closing, preview discarded");
            return;
        }
        if !self.authorization.is_authorized() {
            debug!(asset = %asset.id(), "Authorization lost, preview discarded");
            return;
        }
        if self.stack.contains(asset.id()) {
            return;
        }
        if !self.stack.can_accept(&asset) {
            debug!(asset = %asset.id(), "Selection filled while resolving, preview discarded");
            return;
        }
        if item.is_none() {
            warn!(asset = %asset.id(), error = %CaptureError::Unresolvable, "Tapped asset not selected");
            self.emit(HostEvent::AssetUnresolvable(asset));
            return;
        }

        match self.stack.push(asset) {
            Ok(()) => self.sync_done_title(),
            Err(e) => debug!(error = %e, "Push rejected"),
        }
    }

    // ===== Camera =====

    fn mark_camera_unavailable(&mut self) {
        if self.camera_available {
            warn!("Camera unavailable, disabling camera features");
            self.camera_available = false;
            self.emit(HostEvent::CameraUnavailable);
        }
    }

    fn on_shutter_pressed(&mut self) {
        if !self.camera_available {
            debug!("Shutter ignored: no camera");
            return;
        }
        if let Err(e) = self.authorization.require() {
            debug!(error = %e, "Shutter ignored without authorization");
            return;
        }
        if !self.is_below_capacity() {
            debug!("Shutter ignored: selection full");
            return;
        }
        if self.camera.is_capturing() {
            debug!("Shutter ignored: capture in flight");
            return;
        }

        let location = self.location.filter(|_| self.config.record_location);
        match self.camera.begin_capture(location) {
            Ok(capture) => {
                self.emit(HostEvent::CaptureStarted);
                self.spawn(async move { Completion::CaptureFinished(capture.await) });
            }
            Err(CaptureError::DeviceUnavailable) => self.mark_camera_unavailable(),
            Err(e) => debug!(error = %e, "Capture not started"),
        }
    }

    fn on_capture_finished(&mut self, result: Result<MediaItem, CaptureError>) {
        self.emit(HostEvent::CaptureFinished);

        let item = match result {
            Ok(item) => item,
            Err(CaptureError::DeviceUnavailable) => {
                self.mark_camera_unavailable();
                return;
            }
            Err(e) => {
                self.emit(HostEvent::CaptureFailed(e));
                return;
            }
        };

        if self.closing {
            debug!(asset = %item.asset().id(), "Session closing, capture not selected");
            return;
        }

        let asset = item.asset().clone();
        if !self.assets.contains(&asset) {
            self.assets.insert(0, asset.clone());
            self.emit(HostEvent::AssetAdded(asset.clone()));
        }

        // Already decoded by the capture; no decodability probe
        if !self.stack.can_accept(&asset) {
            debug!(asset = %asset.id(), "Selection filled during capture");
            return;
        }
        match self.stack.push(asset) {
            Ok(()) => self.sync_done_title(),
            Err(e) => debug!(error = %e, "Captured asset not selected"),
        }
    }

    fn on_flash_pressed(&mut self) {
        if !self.camera_available {
            return;
        }
        let mode = self.camera.cycle_flash();
        self.emit(HostEvent::FlashModeChanged(mode));
    }

    fn on_rotate_pressed(&mut self) {
        if !self.camera_available || !self.config.can_rotate_camera {
            debug!("Camera rotation disabled");
            return;
        }
        match self.camera.switch_camera() {
            Ok(position) => {
                self.emit(HostEvent::CameraSwitched(position));
                self.emit(HostEvent::FlashAvailabilityChanged(self.camera.has_flash()));
            }
            Err(e) => warn!(error = %e, "Camera switch failed"),
        }
    }

    fn on_zoom(&mut self, gesture: ZoomGesture) {
        if !self.camera_available || !self.config.allow_pinch_to_zoom {
            return;
        }
        let result = match gesture {
            ZoomGesture::Began => {
                self.camera.begin_zoom();
                return;
            }
            ZoomGesture::Changed(scale) => self.camera.set_zoom(scale),
            ZoomGesture::Ended(scale) => self.camera.end_zoom(scale),
        };
        match result {
            Ok(factor) => self.emit(HostEvent::ZoomChanged(factor)),
            Err(e) => debug!(error = %e, "Zoom ignored"),
        }
    }

    // ===== Terminal actions =====

    fn resolve_selection(&mut self, delivery: Delivery) {
        let assets = self.stack.snapshot();
        let size = self.config.output_size_or_default();
        let resolver = Arc::clone(&self.resolver);
        info!(count = assets.len(), %size, ?delivery, "Resolving selection");

        self.spawn(async move {
            let items = resolve_all(resolver, assets, size).await;
            Completion::SelectionResolved { delivery, items }
        });
    }

    fn on_done(&mut self) {
        self.closing = true;
        self.resolve_selection(Delivery::Picked);
    }

    fn on_cancel(&mut self) {
        info!("Picker cancelled");
        self.closing = true;
        self.finished = true;
        self.emit(HostEvent::Cancelled);
    }

    fn on_stack_pressed(&mut self) {
        self.resolve_selection(Delivery::Previewed);
    }

    fn on_selection_resolved(&mut self, delivery: Delivery, items: Vec<MediaItem>) {
        match delivery {
            Delivery::Picked => {
                if self.finished {
                    return;
                }
                info!(count = items.len(), "Picker done");
                self.finished = true;
                self.emit(HostEvent::Picked(items));
            }
            Delivery::Previewed => {
                if self.finished {
                    debug!("Session finished, preview dropped");
                    return;
                }
                self.emit(HostEvent::Previewed(items));
            }
        }
    }
}

impl std::fmt::Debug for PickerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickerCoordinator")
            .field("config", &self.config)
            .field("assets", &self.assets.len())
            .field("selection", &self.stack)
            .field("authorization", &self.authorization)
            .field("camera", &self.camera)
            .field("closing", &self.closing)
            .field("finished", &self.finished)
            .finish()
    }
}
