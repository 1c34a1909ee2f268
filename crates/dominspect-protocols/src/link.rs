//! Keepalive link between a page agent and its host context.
//!
//! The link carries no messages. Its only job is to tell the page agent that
//! the other side went away: the host keeps a [`LinkKeeper`], the agent keeps
//! the [`HostLink`], and dropping the keeper closes the link.

use async_trait::async_trait;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::InspectError;

/// Agent side of a keepalive link.
#[derive(Debug)]
pub struct HostLink {
    id: Uuid,
    rx: oneshot::Receiver<()>,
    closed: bool,
}

/// Host side of a keepalive link.
#[derive(Debug)]
pub struct LinkKeeper {
    id: Uuid,
    tx: oneshot::Sender<()>,
}

impl HostLink {
    /// Create a connected keeper/link pair.
    pub fn pair() -> (LinkKeeper, HostLink) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        (
            LinkKeeper { id, tx },
            HostLink {
                id,
                rx,
                closed: false,
            },
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Resolves once the keeper is dropped. Stays pending forever after it has
    /// resolved once.
    pub async fn closed(&mut self) {
        if self.closed {
            std::future::pending::<()>().await;
        }
        let _ = (&mut self.rx).await;
        self.closed = true;
    }

    pub fn is_closed(&mut self) -> bool {
        if !self.closed && matches!(self.rx.try_recv(), Err(oneshot::error::TryRecvError::Closed)) {
            self.closed = true;
        }
        self.closed
    }
}

impl LinkKeeper {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the agent side has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Opens keepalive links toward the host context.
#[async_trait]
pub trait HostConnector: Send + Sync {
    async fn connect(&self) -> Result<HostLink, InspectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_link_closes_when_keeper_dropped() {
        let (keeper, mut link) = HostLink::pair();
        assert_eq!(keeper.id(), link.id());
        assert!(!link.is_closed());

        drop(keeper);
        link.closed().await;
        assert!(link.is_closed());
    }

    #[test]
    fn test_keeper_sees_abandoned_link() {
        let (keeper, link) = HostLink::pair();
        assert!(!keeper.is_abandoned());
        drop(link);
        assert!(keeper.is_abandoned());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_link_stays_pending() {
        let (keeper, mut link) = HostLink::pair();
        drop(keeper);
        link.closed().await;

        let again = tokio::time::timeout(std::time::Duration::from_secs(1), link.closed()).await;
        assert!(again.is_err());
    }
}
