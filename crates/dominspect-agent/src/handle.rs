//! Client side of a page agent.

use std::time::Duration;

use dominspect_protocols::{
    Ack, AckResponder, Command, CommandOutcome, CommandTarget, InspectError, PendingAck,
};
use tokio::sync::{mpsc, oneshot};

use crate::session::SessionState;

pub(crate) enum AgentMessage {
    Command {
        command: Command,
        reply: AckResponder,
    },
    State(oneshot::Sender<SessionState>),
}

/// Cloneable handle for sending commands to a running [`PageAgent`](crate::PageAgent).
#[derive(Clone)]
pub struct AgentHandle {
    tx: mpsc::UnboundedSender<AgentMessage>,
}

impl AgentHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<AgentMessage>) -> Self {
        Self { tx }
    }

    /// Send a command and wait at most `timeout` for its acknowledgement.
    pub async fn dispatch(&self, command: Command, timeout: Duration) -> Result<Ack, InspectError> {
        self.send(command).resolve(timeout).await
    }

    /// Snapshot of the agent's session.
    pub async fn state(&self) -> Result<SessionState, InspectError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(AgentMessage::State(tx))
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())
    }

    /// Whether the agent loop has exited.
    pub fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }
}

impl CommandTarget for AgentHandle {
    fn send(&self, command: Command) -> CommandOutcome {
        let (reply, pending) = PendingAck::channel();
        match self.tx.send(AgentMessage::Command { command, reply }) {
            Ok(()) => CommandOutcome::Pending(pending),
            Err(_) => CommandOutcome::failure(&stopped()),
        }
    }
}

fn stopped() -> InspectError {
    InspectError::Transport("page agent stopped".to_string())
}
