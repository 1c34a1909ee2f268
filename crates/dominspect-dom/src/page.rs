//! The inspected page: a shared document plus event dispatch.
//!
//! Listeners are registered with [`Page::subscribe`] and receive events on
//! their own channel. The returned [`Subscription`] unregisters itself when
//! dropped, so a listener can never outlive the session that owns it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::document::{Document, NodeId};

/// Document shared between the page and the agent inspecting it.
pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEventKind {
    Click,
    PageHide,
    Unload,
}

#[derive(Debug, Clone)]
pub enum PageEvent {
    Click(ClickEvent),
    PageHide,
    Unload,
}

impl PageEvent {
    pub fn kind(&self) -> PageEventKind {
        match self {
            PageEvent::Click(_) => PageEventKind::Click,
            PageEvent::PageHide => PageEventKind::PageHide,
            PageEvent::Unload => PageEventKind::Unload,
        }
    }
}

/// A user click on a node. Listeners may cancel the default action.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    target: NodeId,
    default_prevented: Arc<AtomicBool>,
}

impl ClickEvent {
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            default_prevented: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Suppress the page's own reaction (link navigation, form submit, ...).
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

struct ListenerEntry {
    id: u64,
    kinds: Vec<PageEventKind>,
    tx: mpsc::UnboundedSender<PageEvent>,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<ListenerEntry>,
}

/// The inspected page.
#[derive(Clone)]
pub struct Page {
    document: SharedDocument,
    listeners: Arc<Mutex<ListenerTable>>,
}

impl Page {
    pub fn new(document: Document) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
            listeners: Arc::new(Mutex::new(ListenerTable::default())),
        }
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Register a listener for the given event kinds.
    pub fn subscribe(&self, kinds: &[PageEventKind]) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut table = self.listeners.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.push(ListenerEntry {
            id,
            kinds: kinds.to_vec(),
            tx,
        });
        debug!("Page listener {} attached for {:?}", id, kinds);

        Subscription {
            id,
            rx,
            table: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every listener registered for its kind. Returns the
    /// number of listeners reached.
    pub fn dispatch(&self, event: PageEvent) -> usize {
        let kind = event.kind();
        let mut table = self.listeners.lock();
        table.entries.retain(|entry| !entry.tx.is_closed());

        let mut delivered = 0;
        for entry in table.entries.iter().filter(|e| e.kinds.contains(&kind)) {
            if entry.tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!("Dispatched {:?} to {} listener(s)", kind, delivered);
        delivered
    }

    /// Simulate a user click on `target`.
    pub fn click(&self, target: NodeId) -> ClickEvent {
        let event = ClickEvent::new(target);
        self.dispatch(PageEvent::Click(event.clone()));
        event
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().entries.len()
    }
}

/// A registered listener. Dropping it unregisters the listener.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<PageEvent>,
    table: Weak<Mutex<ListenerTable>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn recv(&mut self) -> Option<PageEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PageEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.lock().entries.retain(|entry| entry.id != self.id);
            debug!("Page listener {} detached", self.id);
        }
    }
}
