//! Relay actor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dominspect_protocols::{
    Ack, AckResponder, Command, CommandOutcome, CommandTarget, HostLink, InspectError,
    InspectorEvent, LinkKeeper, TabId,
};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::handle::RelayHandle;

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;

const EVENT_BUFFER: usize = 64;

pub(crate) enum RelayMessage {
    RegisterTab {
        tab: TabId,
        agent: Arc<dyn CommandTarget>,
    },
    RemoveTab {
        tab: TabId,
        reply: oneshot::Sender<bool>,
    },
    Inspect {
        tab: TabId,
        reply: oneshot::Sender<Result<CommandOutcome, InspectError>>,
    },
    Command {
        command: Command,
        reply: AckResponder,
    },
    Event {
        tab: TabId,
        event: InspectorEvent,
    },
    Connect {
        tab: TabId,
        reply: oneshot::Sender<Result<HostLink, InspectError>>,
    },
    DropLinks {
        tab: TabId,
        reply: oneshot::Sender<usize>,
    },
    Status(oneshot::Sender<RelayStatus>),
    Shutdown,
}

/// Relay state as reported by [`RelayHandle::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    pub current: Option<TabId>,
    pub activated_at: Option<DateTime<Utc>>,
    pub tabs: Vec<TabId>,
    pub open_links: usize,
}

struct TabEntry {
    agent: Arc<dyn CommandTarget>,
    links: Vec<LinkKeeper>,
}

struct CurrentTarget {
    tab: TabId,
    activated_at: DateTime<Utc>,
}

/// The relay actor. Owns the tab registry and the current target.
pub struct Relay {
    tabs: HashMap<TabId, TabEntry>,
    current: Option<CurrentTarget>,
    events: broadcast::Sender<InspectorEvent>,
    inbox: mpsc::UnboundedReceiver<RelayMessage>,
    ack_timeout: Duration,
}

impl Relay {
    /// Start the relay. `ack_timeout` bounds how long a forwarded command
    /// waits for the page agent's acknowledgement.
    pub fn spawn(ack_timeout: Duration) -> (RelayHandle, JoinHandle<()>) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let relay = Self {
            tabs: HashMap::new(),
            current: None,
            events: events.clone(),
            inbox,
            ack_timeout,
        };
        let handle = RelayHandle::new(tx, events);
        (handle, tokio::spawn(relay.run()))
    }

    async fn run(mut self) {
        info!("Relay started");
        while let Some(message) = self.inbox.recv().await {
            if !self.handle(message) {
                break;
            }
        }
        self.tabs.clear();
        info!("Relay stopped");
    }

    /// Handle one message. Never awaits a page agent, so an agent calling
    /// back into the relay (connect, events) cannot deadlock it.
    fn handle(&mut self, message: RelayMessage) -> bool {
        match message {
            RelayMessage::RegisterTab { tab, agent } => self.register_tab(tab, agent),
            RelayMessage::RemoveTab { tab, reply } => {
                let _ = reply.send(self.remove_tab(tab));
            }
            RelayMessage::Inspect { tab, reply } => {
                let _ = reply.send(self.inspect(tab));
            }
            RelayMessage::Command { command, reply } => self.forward(command, reply),
            RelayMessage::Event { tab, event } => self.rebroadcast(tab, event),
            RelayMessage::Connect { tab, reply } => {
                let _ = reply.send(self.open_link(tab));
            }
            RelayMessage::DropLinks { tab, reply } => {
                let dropped = self
                    .tabs
                    .get_mut(&tab)
                    .map(|entry| entry.links.drain(..).count())
                    .unwrap_or(0);
                debug!("Dropped {} host link(s) of {}", dropped, tab);
                let _ = reply.send(dropped);
            }
            RelayMessage::Status(reply) => {
                let _ = reply.send(self.status());
            }
            RelayMessage::Shutdown => return false,
        }
        true
    }

    fn register_tab(&mut self, tab: TabId, agent: Arc<dyn CommandTarget>) {
        match self.tabs.get_mut(&tab) {
            Some(entry) => {
                let stale = entry.links.drain(..).count();
                debug!(
                    "Page agent re-injected into {}, dropped {} stale host link(s)",
                    tab, stale
                );
                entry.agent = agent.clone();
                if self.current.as_ref().is_some_and(|c| c.tab == tab) {
                    info!("Re-activating re-injected agent in {}", tab);
                    self.notify(tab, agent, Command::Activate);
                }
            }
            None => {
                debug!("Registered {}", tab);
                self.tabs.insert(
                    tab,
                    TabEntry {
                        agent,
                        links: Vec::new(),
                    },
                );
            }
        }
    }

    fn remove_tab(&mut self, tab: TabId) -> bool {
        let removed = self.tabs.remove(&tab).is_some();
        if self.current.as_ref().is_some_and(|c| c.tab == tab) {
            info!("Inspected {} went away", tab);
            self.current = None;
        }
        removed
    }

    fn inspect(&mut self, tab: TabId) -> Result<CommandOutcome, InspectError> {
        let agent = self
            .tabs
            .get(&tab)
            .map(|entry| entry.agent.clone())
            .ok_or(InspectError::UnknownTab(tab))?;

        let previous = self.current.as_ref().map(|c| c.tab);
        if previous == Some(tab) {
            debug!("Re-activating {}", tab);
        } else {
            if let Some(previous) = previous {
                self.deactivate(previous);
            }
            info!("Inspecting {}", tab);
            self.current = Some(CurrentTarget {
                tab,
                activated_at: Utc::now(),
            });
        }
        Ok(agent.send(Command::Activate))
    }

    /// Best-effort deactivation of a tab that is no longer inspected.
    fn deactivate(&self, tab: TabId) {
        if let Some(entry) = self.tabs.get(&tab) {
            self.notify(tab, entry.agent.clone(), Command::Deactivate);
        }
    }

    /// Send `command` without waiting; the outcome is only logged.
    fn notify(&self, tab: TabId, agent: Arc<dyn CommandTarget>, command: Command) {
        let name = command.name();
        let outcome = agent.send(command);
        let timeout = self.ack_timeout;
        tokio::spawn(async move {
            match outcome.resolve(timeout).await {
                Ok(ack) if ack.success => debug!("{} acknowledged by {}", name, tab),
                Ok(ack) => debug!("{} to {} failed: {:?}", name, tab, ack.error),
                Err(e) => debug!("{} to {} failed: {}", name, tab, e),
            }
        });
    }

    fn forward(&self, command: Command, reply: AckResponder) {
        let agent = self
            .current
            .as_ref()
            .and_then(|current| self.tabs.get(&current.tab))
            .map(|entry| entry.agent.clone());
        let Some(agent) = agent else {
            reply.respond(Ack::from_error(&InspectError::NoTarget));
            return;
        };

        trace!("Forwarding {}", command.name());
        match agent.send(command) {
            CommandOutcome::Immediate(ack) => reply.respond(ack),
            CommandOutcome::Pending(pending) => {
                let timeout = self.ack_timeout;
                tokio::spawn(async move {
                    let ack = match pending.wait(timeout).await {
                        Ok(ack) => ack,
                        Err(e) => Ack::from_error(&e),
                    };
                    reply.respond(ack);
                });
            }
        }
    }

    fn rebroadcast(&self, tab: TabId, event: InspectorEvent) {
        if self.current.as_ref().map(|c| c.tab) != Some(tab) {
            trace!("Ignoring event from {} (not inspected)", tab);
            return;
        }
        if self.events.send(event).is_err() {
            trace!("No panel subscribed");
        }
    }

    fn open_link(&mut self, tab: TabId) -> Result<HostLink, InspectError> {
        let Some(entry) = self.tabs.get_mut(&tab) else {
            warn!("Host link requested by unknown {}", tab);
            return Err(InspectError::UnknownTab(tab));
        };
        entry.links.retain(|keeper| !keeper.is_abandoned());
        let (keeper, link) = HostLink::pair();
        debug!("Opened host link {} for {}", keeper.id(), tab);
        entry.links.push(keeper);
        Ok(link)
    }

    fn status(&self) -> RelayStatus {
        let mut tabs: Vec<TabId> = self.tabs.keys().copied().collect();
        tabs.sort();
        RelayStatus {
            current: self.current.as_ref().map(|c| c.tab),
            activated_at: self.current.as_ref().map(|c| c.activated_at),
            tabs,
            open_links: self
                .tabs
                .values()
                .flat_map(|entry| entry.links.iter())
                .filter(|keeper| !keeper.is_abandoned())
                .count(),
        }
    }
}
