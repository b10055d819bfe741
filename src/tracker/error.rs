//! Error types for the Order tracker.

use crate::framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur while tracking an order.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackerError {
    /// The order could not be loaded.
    #[error("Order not found: {0}")]
    NotFound(String),

    /// An error occurred while communicating with the tracker actor.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),

    /// The tracker task panicked or was aborted.
    #[error("Tracker task failed: {0}")]
    TaskFailed(String),
}

impl From<String> for TrackerError {
    fn from(msg: String) -> Self {
        TrackerError::ActorCommunicationError(msg)
    }
}

impl From<FrameworkError> for TrackerError {
    fn from(e: FrameworkError) -> Self {
        TrackerError::ActorCommunicationError(e.to_string())
    }
}
