//! Commands, events and acknowledgements exchanged between the actors.
//!
//! ## Shapes
//!
//! ```text
//! command  { "type": "activate" | "deactivate" | "getRoot" | "select"
//!                  | "preview" | "clearPreview" | "cleanup", "path"?: [..] }
//! event    { "type": "elementUpdated", "element": { .. } }
//! ack      { "success": bool, "error"?: string }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::element::SerializedElement;
use crate::error::InspectError;
use crate::outcome::CommandOutcome;
use crate::path::ElementPath;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Failure text sent back for DOM commands received while inactive.
pub const NOT_ACTIVE_MESSAGE: &str = "Extension not active";

/// Identifier of an inspectable tab (one document, one page agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Command sent to a page agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Activate,
    Deactivate,
    GetRoot,
    Select { path: ElementPath },
    Preview { path: ElementPath },
    ClearPreview,
    Cleanup,
}

impl Command {
    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Activate => "activate",
            Command::Deactivate => "deactivate",
            Command::GetRoot => "getRoot",
            Command::Select { .. } => "select",
            Command::Preview { .. } => "preview",
            Command::ClearPreview => "clearPreview",
            Command::Cleanup => "cleanup",
        }
    }

    /// DOM commands are refused until the agent is activated; lifecycle
    /// commands are always accepted.
    pub fn requires_active(&self) -> bool {
        !matches!(self, Command::Activate | Command::Deactivate | Command::Cleanup)
    }

    pub fn path(&self) -> Option<&ElementPath> {
        match self {
            Command::Select { path } | Command::Preview { path } => Some(path),
            _ => None,
        }
    }

    /// Decode a command from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, InspectError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fire-and-forget notification from a page agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InspectorEvent {
    ElementUpdated { element: SerializedElement },
}

impl InspectorEvent {
    pub fn element_updated(element: SerializedElement) -> Self {
        InspectorEvent::ElementUpdated { element }
    }

    pub fn element(&self) -> &SerializedElement {
        match self {
            InspectorEvent::ElementUpdated { element } => element,
        }
    }
}

/// Command acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    pub fn from_error(error: &InspectError) -> Self {
        Self::failure(error.to_string())
    }

    pub fn from_result(result: Result<(), InspectError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::from_error(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Anything that accepts commands: a page agent, or the relay in front of
/// the currently inspected one.
pub trait CommandTarget: Send + Sync {
    fn send(&self, command: Command) -> CommandOutcome;
}

/// Destination of a page agent's events. Delivery is at-most-once.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: InspectorEvent) -> Result<(), InspectError>;
}

impl EventSink for mpsc::UnboundedSender<InspectorEvent> {
    fn emit(&self, event: InspectorEvent) -> Result<(), InspectError> {
        self.send(event)
            .map_err(|_| InspectError::Transport("event receiver dropped".to_string()))
    }
}
