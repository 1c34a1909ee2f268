//! Panel controller.

use std::sync::Arc;
use std::time::Duration;

use dominspect_config::PanelConfig;
use dominspect_protocols::{
    Ack, Command, CommandTarget, ElementPath, InspectError, InspectorEvent, SerializedElement,
};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::history::{HistoryUpdate, NavigationHistory};

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;

/// Drives one inspection panel.
///
/// Navigation methods return `Ok(true)` once the snapshot they asked for has
/// arrived, `Ok(false)` when the page refused the command (nothing changes),
/// and `Err` only when the target stopped answering within the bounded wait.
pub struct PanelController {
    target: Arc<dyn CommandTarget>,
    events: broadcast::Receiver<InspectorEvent>,
    history: NavigationHistory,
    ack_timeout: Duration,
}

impl PanelController {
    pub fn new(
        target: Arc<dyn CommandTarget>,
        events: broadcast::Receiver<InspectorEvent>,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            target,
            events,
            history: NavigationHistory::new(),
            ack_timeout,
        }
    }

    pub fn from_config(
        target: Arc<dyn CommandTarget>,
        events: broadcast::Receiver<InspectorEvent>,
        config: &PanelConfig,
    ) -> Self {
        Self::new(target, events, config.ack_timeout())
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn current(&self) -> Option<&SerializedElement> {
        self.history.current()
    }

    /// Start over from the document root.
    pub async fn open(&mut self) -> Result<bool, InspectError> {
        self.history.clear();
        self.request(Command::GetRoot, &ElementPath::root()).await
    }

    pub async fn select(&mut self, path: ElementPath) -> Result<bool, InspectError> {
        let command = Command::Select { path: path.clone() };
        self.request(command, &path).await
    }

    /// Navigate into the current element's child at `index`.
    pub async fn enter_child(&mut self, index: u32) -> Result<bool, InspectError> {
        let Some(child) = self
            .current()
            .and_then(|current| current.children.get(index as usize))
        else {
            debug!("No child {} to enter", index);
            return Ok(false);
        };
        let path = child.path.clone();
        self.select(path).await
    }

    pub async fn go_to_parent(&mut self) -> Result<bool, InspectError> {
        let Some(parent) = self.current().and_then(|current| current.path.parent()) else {
            debug!("Already at the root element");
            return Ok(false);
        };
        self.select(parent).await
    }

    /// Return to the previous snapshot. It becomes current right away; the
    /// page highlight then follows and its echo refreshes the snapshot.
    pub async fn back(&mut self) -> Result<bool, InspectError> {
        let Some(previous) = self.history.back() else {
            return Ok(false);
        };
        let path = previous.path.clone();
        self.select(path).await?;
        Ok(true)
    }

    pub async fn hover(&mut self, path: ElementPath) -> Result<Ack, InspectError> {
        self.send(Command::Preview { path }).await
    }

    pub async fn unhover(&mut self) -> Result<Ack, InspectError> {
        self.send(Command::ClearPreview).await
    }

    /// Tell the page to drop all inspection state.
    pub async fn close(&mut self) -> Result<Ack, InspectError> {
        self.send(Command::Cleanup).await
    }

    /// Apply every update that has already arrived. Returns how many.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Panel fell behind, {} update(s) skipped", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        applied
    }

    /// Wait (bounded) for the next update from the page, such as a click.
    pub async fn await_update(&mut self) -> Result<bool, InspectError> {
        let deadline = Instant::now() + self.ack_timeout;
        let event = self.recv_until(deadline).await?;
        self.apply_event(event);
        Ok(true)
    }

    pub fn apply_event(&mut self, event: InspectorEvent) -> HistoryUpdate {
        let InspectorEvent::ElementUpdated { element } = event;
        trace!("elementUpdated {} ({})", element.label(), element.path);
        self.history.apply_update(element)
    }

    async fn send(&self, command: Command) -> Result<Ack, InspectError> {
        let name = command.name();
        let ack = self.target.send(command).resolve(self.ack_timeout).await?;
        if let Some(ref error) = ack.error {
            warn!("{} failed: {}", name, error);
        }
        Ok(ack)
    }

    /// Send `command` and wait for the update for `expected`, both within one
    /// acknowledgement timeout.
    async fn request(
        &mut self,
        command: Command,
        expected: &ElementPath,
    ) -> Result<bool, InspectError> {
        let deadline = Instant::now() + self.ack_timeout;
        if !self.send(command).await?.success {
            return Ok(false);
        }
        loop {
            let event = self.recv_until(deadline).await?;
            let matches = event.element().path == *expected;
            self.apply_event(event);
            if matches {
                return Ok(true);
            }
        }
    }

    async fn recv_until(&mut self, deadline: Instant) -> Result<InspectorEvent, InspectError> {
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Ok(event)) => return Ok(event),
                Ok(Err(RecvError::Lagged(skipped))) => {
                    warn!("Panel fell behind, {} update(s) skipped", skipped);
                }
                Ok(Err(RecvError::Closed)) => return Err(InspectError::ConnectionLost),
                Err(_) => return Err(InspectError::Timeout(self.ack_timeout.as_millis() as u64)),
            }
        }
    }
}
