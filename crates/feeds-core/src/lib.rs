//! In-memory subscription fan-out engine.
//!
//! Three hub registries (channels, active subscribers, notification destinations) are
//! cross-linked by two join records: a [`Membership`] ties a channel to an active
//! subscriber and a [`Route`] ties an active subscriber to a peer connection. Join
//! records only carry the ids of the hubs they connect, so they never keep a hub alive.

pub mod channels;
pub mod destinations;
pub mod error;
pub mod fanout;
pub mod hub;
pub mod registry;
pub mod store;
pub mod subscribers;
pub mod transport;

#[cfg(test)]
mod testing;

pub use channels::{Channel, ChannelRegistry, ChannelUpdate, NewChannel};
pub use destinations::{DestinationRegistry, NotificationDestination};
pub use error::{FeedsError, Result};
pub use hub::FeedsHub;
pub use registry::FeedsRegistry;
pub use store::Store;
pub use subscribers::{ActiveSubscriber, Membership, Route, SubscriberRegistry};
pub use transport::{Transport, TransportError};

/// Current wall-clock time in seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
