//! Periodic check that the highlight treatment is still applied.
//!
//! Page scripts are free to rewrite inline styles. While a highlight exists the
//! watchdog nudges the agent loop every interval; the loop owns the document
//! and does the actual repair, so the watchdog never touches the page itself.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::trace;

/// Internal signals delivered to the agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AgentSignal {
    StyleCheck,
}

/// Running watchdog task. Dropping the handle cancels the task.
pub(crate) struct StyleWatchdog {
    token: CancellationToken,
    _guard: DropGuard,
}

impl StyleWatchdog {
    /// Start ticking every `period`. A zero period is refused.
    pub(crate) fn start(
        period: Duration,
        signals: mpsc::UnboundedSender<AgentSignal>,
    ) -> Option<Self> {
        if period.is_zero() {
            return None;
        }
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            trace!("Style watchdog started ({:?})", period);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if signals.send(AgentSignal::StyleCheck).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!("Style watchdog stopped");
        });

        Some(Self {
            _guard: token.clone().drop_guard(),
            token,
        })
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }
}
