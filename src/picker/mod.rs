// SPDX-License-Identifier: GPL-3.0-only

//! Picker session logic
//!
//! - [`selection`]: ordered, capacity-bounded selection stack
//! - [`capture`]: camera control state machine
//! - [`authorization`]: library permission status
//! - [`coordinator`]: sequences intents and completions for one session

pub mod authorization;
pub mod capture;
pub mod coordinator;
pub mod selection;

pub use authorization::AuthorizationStatus;
pub use capture::{CaptureController, CapturePhase, CaptureState};
pub use coordinator::{DoneTitle, HostEvent, Message, PickerCoordinator, PickerHandle, ZoomGesture};
pub use selection::{SelectMode, SelectionEvent, SelectionStack};
