//! Immediate vs. pending command acknowledgements.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::InspectError;
use crate::message::Ack;

/// Result of handing a command to a [`CommandTarget`](crate::CommandTarget).
///
/// A handler that can answer on the spot returns `Immediate`; one that has to
/// wait on another actor returns `Pending`, and the caller resolves it with a
/// bounded wait.
#[derive(Debug)]
pub enum CommandOutcome {
    Immediate(Ack),
    Pending(PendingAck),
}

impl CommandOutcome {
    pub fn failure(error: &InspectError) -> Self {
        CommandOutcome::Immediate(Ack::from_error(error))
    }

    /// Wait for the acknowledgement, giving up after `timeout`.
    pub async fn resolve(self, timeout: Duration) -> Result<Ack, InspectError> {
        match self {
            CommandOutcome::Immediate(ack) => Ok(ack),
            CommandOutcome::Pending(pending) => pending.wait(timeout).await,
        }
    }
}

/// Receiving half of a deferred acknowledgement.
#[derive(Debug)]
pub struct PendingAck {
    rx: oneshot::Receiver<Ack>,
}

impl PendingAck {
    /// Create a responder/pending pair.
    pub fn channel() -> (AckResponder, PendingAck) {
        let (tx, rx) = oneshot::channel();
        (AckResponder { tx }, PendingAck { rx })
    }

    pub async fn wait(self, timeout: Duration) -> Result<Ack, InspectError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(InspectError::Transport(
                "acknowledgement dropped".to_string(),
            )),
            Err(_) => Err(InspectError::Timeout(timeout.as_millis() as u64)),
        }
    }
}

/// Sending half of a deferred acknowledgement.
#[derive(Debug)]
pub struct AckResponder {
    tx: oneshot::Sender<Ack>,
}

impl AckResponder {
    /// Deliver the acknowledgement; a caller that stopped waiting is ignored.
    pub fn respond(self, ack: Ack) {
        if self.tx.send(ack).is_err() {
            trace!("Acknowledgement receiver gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_immediate_resolves() {
        let outcome = CommandOutcome::Immediate(Ack::ok());
        assert!(outcome.resolve(Duration::from_secs(1)).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_pending_resolves() {
        let (responder, pending) = PendingAck::channel();
        tokio::spawn(async move {
            responder.respond(Ack::failure("boom"));
        });
        let ack = CommandOutcome::Pending(pending)
            .resolve(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(ack.error.as_deref(), Some("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_times_out() {
        let (_responder, pending) = PendingAck::channel();
        let err = pending.wait(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err, InspectError::Timeout(5000));
    }

    #[tokio::test]
    async fn test_dropped_responder() {
        let (responder, pending) = PendingAck::channel();
        drop(responder);
        let err = pending.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, InspectError::Transport(_)));
    }

    #[test]
    fn test_respond_after_receiver_dropped() {
        let (responder, pending) = PendingAck::channel();
        drop(pending);
        responder.respond(Ack::ok());
    }
}
