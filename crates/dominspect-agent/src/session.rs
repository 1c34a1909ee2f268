//! Per-page inspection session.

use dominspect_dom::{Document, Subscription};
use dominspect_protocols::{ElementPath, HostLink};
use serde::Serialize;
use tracing::debug;

use crate::highlight::{Highlighter, Treatment};
use crate::watchdog::StyleWatchdog;

/// Everything an active inspection holds on to. Clearing the session
/// releases all of it: outlines are restored, the page listeners and the host
/// link are dropped, and the watchdog is cancelled.
pub(crate) struct InspectionSession {
    pub(crate) active: bool,
    pub(crate) highlighter: Highlighter,
    pub(crate) listeners: Option<Subscription>,
    pub(crate) link: Option<HostLink>,
    pub(crate) watchdog: Option<StyleWatchdog>,
    pub(crate) reconnect_failures: u32,
}

impl InspectionSession {
    pub(crate) fn new(treatment: Treatment) -> Self {
        Self {
            active: false,
            highlighter: Highlighter::new(treatment),
            listeners: None,
            link: None,
            watchdog: None,
            reconnect_failures: 0,
        }
    }

    pub(crate) fn clear(&mut self, doc: &mut Document) {
        self.highlighter.clear_all(doc);
        self.active = false;
        self.listeners = None;
        self.link = None;
        self.watchdog = None;
        debug!("Inspection session cleared");
    }
}

/// Point-in-time view of a page agent's session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub active: bool,
    pub highlighted: Option<ElementPath>,
    pub previewed: Option<ElementPath>,
    /// Page click/pagehide/unload listeners attached.
    pub listening: bool,
    /// Host link currently open.
    pub linked: bool,
    pub reconnect_failures: u32,
    pub reconnect_pending: bool,
    pub style_watch_running: bool,
}
