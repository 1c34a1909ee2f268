//! Page agent command loop.
//!
//! One task owns the inspection session and is the only writer of highlight
//! state. It multiplexes four inputs:
//!
//! - commands from the relay (acknowledged one by one, in arrival order)
//! - page events (click, pagehide, unload) while listeners are attached
//! - the host link closing, and the reconnect timer that follows
//! - style watchdog ticks

use std::pin::Pin;
use std::sync::Arc;

use dominspect_config::{AgentConfig, HighlightConfig};
use dominspect_dom::{ClickEvent, Page, PageEvent, PageEventKind, Subscription};
use dominspect_protocols::{
    Ack, Command, ElementPath, EventSink, HostConnector, HostLink, InspectError, InspectorEvent,
    SerializedElement,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, info, trace, warn};

use crate::addressing::{path_of, resolve};
use crate::handle::{AgentHandle, AgentMessage};
use crate::highlight::Treatment;
use crate::serialize::{SerializeOptions, serialize};
use crate::session::{InspectionSession, SessionState};
use crate::watchdog::{AgentSignal, StyleWatchdog};

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

const LISTENED_EVENTS: [PageEventKind; 3] = [
    PageEventKind::Click,
    PageEventKind::PageHide,
    PageEventKind::Unload,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// The in-page inspection agent.
pub struct PageAgent {
    page: Page,
    config: AgentConfig,
    serialize_options: SerializeOptions,
    connector: Arc<dyn HostConnector>,
    events: Arc<dyn EventSink>,
    session: InspectionSession,
    inbox: mpsc::UnboundedReceiver<AgentMessage>,
    signals_tx: mpsc::UnboundedSender<AgentSignal>,
    signals: mpsc::UnboundedReceiver<AgentSignal>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl PageAgent {
    /// Create an agent for `page`. Nothing runs until [`PageAgent::run`] is
    /// polled; the agent starts inactive.
    pub fn new(
        page: Page,
        config: AgentConfig,
        highlight: &HighlightConfig,
        connector: Arc<dyn HostConnector>,
        events: Arc<dyn EventSink>,
    ) -> (Self, AgentHandle) {
        let mut config = config;
        if config.style_check_enabled && config.style_check_interval_ms == 0 {
            warn!("style_check_interval_ms is 0, style checks disabled");
            config.style_check_enabled = false;
        }
        let (tx, inbox) = mpsc::unbounded_channel();
        let (signals_tx, signals) = mpsc::unbounded_channel();
        let agent = Self {
            page,
            serialize_options: SerializeOptions::from(&config),
            config,
            connector,
            events,
            session: InspectionSession::new(Treatment::from(highlight)),
            inbox,
            signals_tx,
            signals,
            reconnect: None,
        };
        (agent, AgentHandle::new(tx))
    }

    /// Create an agent and run it on a new task.
    pub fn spawn(
        page: Page,
        config: AgentConfig,
        highlight: &HighlightConfig,
        connector: Arc<dyn HostConnector>,
        events: Arc<dyn EventSink>,
    ) -> (AgentHandle, JoinHandle<()>) {
        let (agent, handle) = Self::new(page, config, highlight, connector, events);
        (handle, tokio::spawn(agent.run()))
    }

    /// Run until every handle is dropped or the page unloads.
    pub async fn run(mut self) {
        debug!("Page agent started");
        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => {
                        debug!("All agent handles dropped");
                        break;
                    }
                },
                Some(event) = next_page_event(&mut self.session.listeners) => {
                    if self.handle_page_event(event) == Flow::Stop {
                        break;
                    }
                }
                _ = link_closed(&mut self.session.link) => self.on_link_lost(),
                _ = reconnect_due(&mut self.reconnect) => {
                    self.reconnect = None;
                    if self.session.active {
                        self.connect_link().await;
                    }
                }
                Some(signal) = self.signals.recv() => self.handle_signal(signal),
            }
        }
        self.clear_session("agent stopped");
        debug!("Page agent stopped");
    }

    async fn handle_message(&mut self, message: AgentMessage) {
        match message {
            AgentMessage::Command { command, reply } => {
                let name = command.name();
                trace!("Handling command {}", name);
                let ack = Ack::from_result(self.execute(command).await);
                if let Some(ref error) = ack.error {
                    debug!("Command {} failed: {}", name, error);
                }
                reply.respond(ack);
            }
            AgentMessage::State(reply) => {
                let _ = reply.send(self.state());
            }
        }
    }

    async fn execute(&mut self, command: Command) -> Result<(), InspectError> {
        if command.requires_active() && !self.session.active {
            return Err(InspectError::NotActive);
        }
        match command {
            Command::Activate => self.activate().await,
            Command::Deactivate => {
                self.clear_session("deactivate");
                Ok(())
            }
            Command::Cleanup => {
                self.clear_session("cleanup");
                Ok(())
            }
            Command::GetRoot => {
                let element = self.snapshot(&ElementPath::root())?;
                self.emit(element);
                Ok(())
            }
            Command::Select { path } => self.select(&path),
            Command::Preview { path } => self.preview(&path),
            Command::ClearPreview => {
                let mut doc = self.page.document().lock();
                self.session.highlighter.clear_preview(&mut doc);
                Ok(())
            }
        }
    }

    async fn activate(&mut self) -> Result<(), InspectError> {
        if !self.session.active {
            info!("Page agent activated");
        }
        self.session.active = true;
        self.session.reconnect_failures = 0;

        if self.session.listeners.is_none() {
            self.session.listeners = Some(self.page.subscribe(&LISTENED_EVENTS));
        }
        if self.session.link.is_none() && self.reconnect.is_none() {
            self.connect_link().await;
        }

        let root = self.snapshot(&ElementPath::root())?;
        self.emit(root);
        Ok(())
    }

    fn select(&mut self, path: &ElementPath) -> Result<(), InspectError> {
        let element = {
            let mut doc = self.page.document().lock();
            let node =
                resolve(&doc, path).ok_or_else(|| InspectError::PathResolution(path.clone()))?;
            self.session.highlighter.apply_highlight(&mut doc, node);
            serialize(&doc, node, path.clone(), &self.serialize_options)
        };
        self.sync_watchdog();
        self.emit(element);
        Ok(())
    }

    fn preview(&mut self, path: &ElementPath) -> Result<(), InspectError> {
        let mut doc = self.page.document().lock();
        let node = resolve(&doc, path).ok_or_else(|| InspectError::PathResolution(path.clone()))?;
        self.session.highlighter.apply_preview(&mut doc, node);
        Ok(())
    }

    fn snapshot(&self, path: &ElementPath) -> Result<SerializedElement, InspectError> {
        let doc = self.page.document().lock();
        let node = resolve(&doc, path).ok_or_else(|| InspectError::PathResolution(path.clone()))?;
        Ok(serialize(&doc, node, path.clone(), &self.serialize_options))
    }

    fn emit(&self, element: SerializedElement) {
        trace!("Emitting elementUpdated for {}", element.path);
        if let Err(e) = self.events.emit(InspectorEvent::element_updated(element)) {
            warn!("Failed to emit elementUpdated: {}", e);
        }
    }

    fn handle_page_event(&mut self, event: PageEvent) -> Flow {
        match event {
            PageEvent::Click(click) => {
                self.on_click(click);
                Flow::Continue
            }
            PageEvent::PageHide => {
                self.clear_session("pagehide");
                Flow::Continue
            }
            PageEvent::Unload => {
                self.clear_session("unload");
                Flow::Stop
            }
        }
    }

    fn on_click(&mut self, click: ClickEvent) {
        if !self.session.active {
            return;
        }
        click.prevent_default();

        let element = {
            let mut doc = self.page.document().lock();
            let Some(node) = doc.closest_element(click.target()) else {
                return;
            };
            let Some(path) = path_of(&doc, node) else {
                debug!("Clicked node {} is not attached", node.index());
                return;
            };
            self.session.highlighter.apply_highlight(&mut doc, node);
            serialize(&doc, node, path, &self.serialize_options)
        };
        self.sync_watchdog();
        self.emit(element);
    }

    async fn connect_link(&mut self) {
        match self.connector.connect().await {
            Ok(link) => {
                debug!("Host link {} established", link.id());
                self.session.link = Some(link);
            }
            Err(e) => {
                warn!("Host link connect failed: {}", e);
                self.on_link_lost();
            }
        }
    }

    fn on_link_lost(&mut self) {
        self.session.link = None;
        if !self.session.active {
            return;
        }

        self.session.reconnect_failures += 1;
        let failures = self.session.reconnect_failures;
        let max = self.config.reconnect_attempts;
        if failures > max {
            warn!("Host link lost after {} reconnection attempts, deactivating", max);
            self.clear_session("reconnection exhausted");
            return;
        }

        let delay = self.config.reconnect_delay();
        info!("Host link lost, reconnecting in {:?} (attempt {}/{})", delay, failures, max);
        self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
    }

    fn handle_signal(&mut self, signal: AgentSignal) {
        match signal {
            AgentSignal::StyleCheck => {
                let mut doc = self.page.document().lock();
                if self.session.highlighter.ensure_highlight_present(&mut doc) {
                    debug!("Highlight treatment was stripped, reapplied");
                }
            }
        }
    }

    /// Run the watchdog exactly while there is a highlight to protect.
    fn sync_watchdog(&mut self) {
        let wanted =
            self.config.style_check_enabled && self.session.highlighter.highlighted().is_some();
        match (wanted, self.session.watchdog.is_some()) {
            (true, false) => {
                self.session.watchdog = StyleWatchdog::start(
                    self.config.style_check_interval(),
                    self.signals_tx.clone(),
                );
            }
            (false, true) => self.session.watchdog = None,
            _ => {}
        }
    }

    fn clear_session(&mut self, reason: &str) {
        if self.session.active {
            info!("Page agent deactivated ({})", reason);
        }
        let mut doc = self.page.document().lock();
        self.session.clear(&mut doc);
        self.reconnect = None;
    }

    fn state(&self) -> SessionState {
        let doc = self.page.document().lock();
        let highlighter = &self.session.highlighter;
        SessionState {
            active: self.session.active,
            highlighted: highlighter.highlighted().and_then(|n| path_of(&doc, n)),
            previewed: highlighter.previewed().and_then(|n| path_of(&doc, n)),
            listening: self.session.listeners.is_some(),
            linked: self.session.link.is_some(),
            reconnect_failures: self.session.reconnect_failures,
            reconnect_pending: self.reconnect.is_some(),
            style_watch_running: self
                .session
                .watchdog
                .as_ref()
                .is_some_and(StyleWatchdog::is_running),
        }
    }
}

async fn next_page_event(listeners: &mut Option<Subscription>) -> Option<PageEvent> {
    match listeners {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

async fn link_closed(link: &mut Option<HostLink>) {
    match link {
        Some(link) => link.closed().await,
        None => std::future::pending().await,
    }
}

async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
