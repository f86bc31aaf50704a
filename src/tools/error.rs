//! Error types for the device tool contract.

use thiserror::Error;

/// Hard failures surfaced by a [`Tools`](super::Tools) implementation.
///
/// Interactive actions (tap, swipe, text, keys, app launch) never produce
/// these; they report a recoverable failure as `false` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolsError {
    /// The device session is unusable (no connection, offline, transport gone).
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The screen could not be captured.
    #[error("Capture error: {0}")]
    Capture(String),
    /// Malformed input rejected at the dispatch boundary.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// No operation with this name is exposed by the tools instance.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl ToolsError {
    /// Whether the error means the current session should be abandoned.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_) | Self::Capture(_))
    }
}
