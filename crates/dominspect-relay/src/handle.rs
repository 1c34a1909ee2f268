//! Handles onto the relay actor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dominspect_agent::{AgentHandle, PageAgent};
use dominspect_config::{AgentConfig, HighlightConfig};
use dominspect_dom::Page;
use dominspect_protocols::{
    Ack, Command, CommandOutcome, CommandTarget, EventSink, HostConnector, HostLink, InspectError,
    InspectorEvent, PendingAck, TabId,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::relay::{RelayMessage, RelayStatus};

/// Cloneable handle to a running [`Relay`](crate::Relay).
///
/// As a [`CommandTarget`] it forwards commands to the currently inspected tab.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::UnboundedSender<RelayMessage>,
    events: broadcast::Sender<InspectorEvent>,
}

impl RelayHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<RelayMessage>,
        events: broadcast::Sender<InspectorEvent>,
    ) -> Self {
        Self { tx, events }
    }

    fn post(&self, message: RelayMessage) -> Result<(), InspectError> {
        self.tx.send(message).map_err(|_| stopped())
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> RelayMessage,
    ) -> Result<T, InspectError> {
        let (tx, rx) = oneshot::channel();
        self.post(message(tx))?;
        rx.await.map_err(|_| stopped())
    }

    /// Register the page agent running in `tab`. Registering an already known
    /// tab replaces its agent (re-injection): the old agent's host links are
    /// dropped, and the new agent is activated if `tab` is being inspected.
    pub fn register_tab(&self, tab: TabId, agent: Arc<dyn CommandTarget>) -> Result<(), InspectError> {
        self.post(RelayMessage::RegisterTab { tab, agent })
    }

    /// Start a page agent for `page` wired to this relay and register it as `tab`.
    pub fn inject_agent(
        &self,
        tab: TabId,
        page: Page,
        config: AgentConfig,
        highlight: &HighlightConfig,
    ) -> Result<(AgentHandle, JoinHandle<()>), InspectError> {
        let (agent, task) = PageAgent::spawn(
            page,
            config,
            highlight,
            Arc::new(self.connector(tab)),
            Arc::new(self.event_sink(tab)),
        );
        self.register_tab(tab, Arc::new(agent.clone()))?;
        Ok((agent, task))
    }

    /// Forget `tab`, dropping its host links. Returns whether it was known.
    pub async fn remove_tab(&self, tab: TabId) -> Result<bool, InspectError> {
        self.request(|reply| RelayMessage::RemoveTab { tab, reply })
            .await
    }

    /// Make `tab` the inspection target and activate its agent, deactivating
    /// the previous target first. Waits at most `timeout` for the activation.
    pub async fn inspect(&self, tab: TabId, timeout: Duration) -> Result<Ack, InspectError> {
        let outcome = self
            .request(|reply| RelayMessage::Inspect { tab, reply })
            .await??;
        outcome.resolve(timeout).await
    }

    /// Subscribe to events of the inspected tab.
    pub fn subscribe(&self) -> broadcast::Receiver<InspectorEvent> {
        self.events.subscribe()
    }

    /// Host connector for the agent running in `tab`.
    pub fn connector(&self, tab: TabId) -> RelayConnector {
        RelayConnector {
            tab,
            tx: self.tx.clone(),
        }
    }

    /// Event sink for the agent running in `tab`.
    pub fn event_sink(&self, tab: TabId) -> RelayEventSink {
        RelayEventSink {
            tab,
            tx: self.tx.clone(),
        }
    }

    /// Sever every host link of `tab`, as if the relay had restarted.
    pub async fn drop_links(&self, tab: TabId) -> Result<usize, InspectError> {
        self.request(|reply| RelayMessage::DropLinks { tab, reply })
            .await
    }

    pub async fn status(&self) -> Result<RelayStatus, InspectError> {
        self.request(RelayMessage::Status).await
    }

    /// Stop the relay loop. Registered agents and host links are dropped.
    pub fn shutdown(&self) {
        let _ = self.post(RelayMessage::Shutdown);
    }
}

impl CommandTarget for RelayHandle {
    fn send(&self, command: Command) -> CommandOutcome {
        let (reply, pending) = PendingAck::channel();
        match self.post(RelayMessage::Command { command, reply }) {
            Ok(()) => CommandOutcome::Pending(pending),
            Err(e) => CommandOutcome::failure(&e),
        }
    }
}

/// [`HostConnector`] that opens host links held by the relay.
#[derive(Clone)]
pub struct RelayConnector {
    tab: TabId,
    tx: mpsc::UnboundedSender<RelayMessage>,
}

#[async_trait]
impl HostConnector for RelayConnector {
    async fn connect(&self) -> Result<HostLink, InspectError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RelayMessage::Connect { tab: self.tab, reply })
            .map_err(|_| InspectError::ConnectionLost)?;
        rx.await.map_err(|_| InspectError::ConnectionLost)?
    }
}

/// [`EventSink`] that hands a tab's events to the relay.
#[derive(Clone)]
pub struct RelayEventSink {
    tab: TabId,
    tx: mpsc::UnboundedSender<RelayMessage>,
}

impl EventSink for RelayEventSink {
    fn emit(&self, event: InspectorEvent) -> Result<(), InspectError> {
        self.tx
            .send(RelayMessage::Event { tab: self.tab, event })
            .map_err(|_| InspectError::ConnectionLost)
    }
}

fn stopped() -> InspectError {
    InspectError::Transport("relay stopped".to_string())
}
