// SPDX-License-Identifier: GPL-3.0-only

//! Media Picker - select photos from a library or capture new ones
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`picker`]: Selection stack, capture controller and session coordinator
//! - [`backends`]: Library and camera abstractions with concrete implementations
//! - [`media`]: Asset references and decoded items
//! - [`config`]: Per-session configuration
//! - [`errors`]: Error types
//!
//! # Example
//!
//! ```ignore
//! let (mut picker, mut events) =
//!     PickerCoordinator::new(config, catalog, resolver, camera);
//! picker.start();
//! let handle = picker.handle();
//! tokio::spawn(picker.run());
//! handle.send(Message::DonePressed);
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod picker;

// Re-export commonly used types
pub use config::{SessionConfig, SourceMode};
pub use errors::{AuthorizationError, CaptureError, PickerError, PickerResult, SelectionError};
pub use media::{AssetId, AssetKind, AssetRef, MediaItem, QualityTier, Size};
pub use picker::{
    AuthorizationStatus, DoneTitle, HostEvent, Message, PickerCoordinator, PickerHandle,
    SelectionEvent, SelectionStack,
};
