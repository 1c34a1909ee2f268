//! Document model for the page agent.
//!
//! An arena of nodes (document, element, text, comment) with parent links,
//! inline style and a scroll viewport, plus the [`Page`] wrapper that
//! dispatches user and lifecycle events to subscribed listeners.

mod document;
mod error;
mod fixture;
mod page;
mod style;

pub use document::{Document, ElementData, NodeId, NodeKind, ScrollRecord};
pub use error::DomError;
pub use fixture::FixtureNode;
pub use page::{ClickEvent, Page, PageEvent, PageEventKind, SharedDocument, Subscription};
pub use style::{InlineStyle, ScrollBehavior, ScrollBlock, ScrollOptions};
