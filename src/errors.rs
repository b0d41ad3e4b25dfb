// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the picker core
//!
//! Selection and capture errors are expected control-flow outcomes: callers
//! branch on them and the session keeps running. Nothing in here is fatal.

use std::fmt;

/// Result type alias using PickerError
pub type PickerResult<T> = Result<T, PickerError>;

/// Umbrella error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerError {
    /// Selection stack rejected a mutation
    Selection(SelectionError),
    /// Camera or capture failure
    Capture(CaptureError),
    /// Photo library access is not granted
    Authorization(AuthorizationError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Io(String),
}

/// Selection stack errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    /// The stack already holds `capacity_limit` assets
    AtCapacity,
    /// The asset is not in the stack
    NotFound,
}

/// Capture errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// A capture is already in flight
    AlreadyCapturing,
    /// Camera hardware is missing or not configured
    DeviceUnavailable,
    /// The captured or requested media could not be decoded
    Unresolvable,
}

/// Authorization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The user refused access
    Denied,
    /// The user has not been asked yet
    Undetermined,
}

impl fmt::Display for PickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerError::Selection(e) => write!(f, "Selection error: {}", e),
            PickerError::Capture(e) => write!(f, "Capture error: {}", e),
            PickerError::Authorization(e) => write!(f, "Authorization error: {}", e),
            PickerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PickerError::Io(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::AtCapacity => write!(f, "Selection is at capacity"),
            SelectionError::NotFound => write!(f, "Asset is not selected"),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::AlreadyCapturing => write!(f, "A capture is already in progress"),
            CaptureError::DeviceUnavailable => write!(f, "Camera device unavailable"),
            CaptureError::Unresolvable => write!(f, "Media could not be decoded"),
        }
    }
}

impl fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationError::Denied => write!(f, "Photo library access denied"),
            AuthorizationError::Undetermined => write!(f, "Photo library access not yet granted"),
        }
    }
}

impl std::error::Error for PickerError {}
impl std::error::Error for SelectionError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for AuthorizationError {}

impl From<SelectionError> for PickerError {
    fn from(err: SelectionError) -> Self {
        PickerError::Selection(err)
    }
}

impl From<CaptureError> for PickerError {
    fn from(err: CaptureError) -> Self {
        PickerError::Capture(err)
    }
}

impl From<AuthorizationError> for PickerError {
    fn from(err: AuthorizationError) -> Self {
        PickerError::Authorization(err)
    }
}

impl From<std::io::Error> for PickerError {
    fn from(err: std::io::Error) -> Self {
        PickerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PickerError {
    fn from(err: serde_json::Error) -> Self {
        PickerError::Config(err.to_string())
    }
}
