//! Inspection errors.

use thiserror::Error;

use crate::message::TabId;
use crate::path::ElementPath;

/// Failures of the inspection protocol.
///
/// None of these ever propagate out of an actor: command handlers turn them
/// into failure acknowledgements and listener callbacks log them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InspectError {
    /// A DOM command arrived before `activate`.
    #[error("Extension not active")]
    NotActive,

    #[error("Path {0} does not resolve to an element")]
    PathResolution(ElementPath),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Connection to host lost")]
    ConnectionLost,

    #[error("No acknowledgement within {0} ms")]
    Timeout(u64),

    #[error("No inspected tab")]
    NoTarget,

    #[error("Unknown tab: {0}")]
    UnknownTab(TabId),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl From<serde_json::Error> for InspectError {
    fn from(e: serde_json::Error) -> Self {
        InspectError::InvalidMessage(e.to_string())
    }
}
