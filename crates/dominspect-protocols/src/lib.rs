//! # dominspect Protocols
//!
//! Shared definitions for the three inspection actors. Contains only wire
//! types and transport traits - no actor implementations.
//!
//! ## Core Types
//!
//! - [`ElementPath`] - positional address of an element from the root element
//! - [`SerializedElement`] - immutable snapshot of an element subtree
//! - [`Command`] / [`InspectorEvent`] / [`Ack`] - the message protocol
//! - [`CommandOutcome`] - immediate or pending acknowledgement
//!
//! ## Transport Traits
//!
//! - [`CommandTarget`] - something that accepts commands (page agent, relay)
//! - [`EventSink`] - where a page agent emits its events
//! - [`HostConnector`] - opens the keepalive link toward the host context

pub mod element;
pub mod error;
pub mod link;
pub mod message;
pub mod outcome;
pub mod path;

pub use element::SerializedElement;
pub use error::InspectError;
pub use link::{HostConnector, HostLink, LinkKeeper};
pub use message::{Ack, Command, CommandTarget, EventSink, InspectorEvent, TabId, NOT_ACTIVE_MESSAGE};
pub use outcome::{AckResponder, CommandOutcome, PendingAck};
pub use path::ElementPath;
