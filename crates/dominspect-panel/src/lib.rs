//! Inspection panel controller.
//!
//! The panel never touches the page. It sends commands through a
//! [`CommandTarget`](dominspect_protocols::CommandTarget) (normally the relay),
//! listens for `elementUpdated` events, and keeps the navigation history of
//! snapshots it has displayed.

mod controller;
mod history;
pub mod render;

pub use controller::PanelController;
pub use history::{HistoryUpdate, NavigationHistory};
pub use render::render_tree;
