//! Page agent for dominspect.
//!
//! Runs next to the inspected document and owns everything that touches it:
//!
//! - [`addressing`] - element <-> [`ElementPath`](dominspect_protocols::ElementPath)
//! - [`serialize`] - element subtree -> [`SerializedElement`](dominspect_protocols::SerializedElement)
//! - [`Highlighter`] - highlight/preview outline state machine
//! - [`PageAgent`] - the command loop, host link reconnection and style watchdog
//!
//! ## Lifecycle
//!
//! ```text
//!            activate                      deactivate / cleanup / pagehide /
//! inactive ───────────► active ──────────► unload / reconnects exhausted
//!    ▲                                              │
//!    └──────────────────────────────────────────────┘
//! ```

pub mod addressing;
mod agent;
mod handle;
mod highlight;
pub mod serialize;
mod session;
mod watchdog;

pub use agent::PageAgent;
pub use handle::AgentHandle;
pub use highlight::{Highlighter, Treatment};
pub use serialize::SerializeOptions;
pub use session::SessionState;
