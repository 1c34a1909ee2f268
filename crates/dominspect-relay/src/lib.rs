//! Relay between inspection panels and page agents.
//!
//! The relay tracks which tab is being inspected, forwards panel commands to
//! that tab's page agent, and rebroadcasts the agent's events to every
//! subscribed panel. It also hosts the keepalive end of each agent's host
//! link, so restarting the relay (or dropping its links) is visible to the
//! agents as a lost connection.

mod handle;
mod relay;

pub use handle::{RelayConnector, RelayEventSink, RelayHandle};
pub use relay::{Relay, RelayStatus};
