use feeds_types::events::Notification;
use feeds_types::models::OWNER_USER_ID;
use tracing::{debug, warn};

use crate::registry::FeedsRegistry;
use crate::subscribers::ActiveSubscriber;
use crate::transport::Transport;

impl FeedsRegistry {
    /// Deliver one notification per route of every active subscriber of `channel_id`.
    /// Returns the number of notifications handed to the transport.
    pub fn notify_channel<T, F>(&self, transport: &T, channel_id: u64, build: F) -> usize
    where
        T: Transport + ?Sized,
        F: Fn() -> Notification,
    {
        let Some(channel) = self.channels.get_by_id(channel_id) else {
            return 0;
        };

        let mut delivered = 0;
        for membership in channel.memberships() {
            if let Some(subscriber) = self.subscribers.get(membership.uid) {
                delivered += deliver_to_subscriber(transport, subscriber, &build);
            }
        }
        delivered
    }

    /// Same walk, rooted at the owner's active subscriber record.
    pub fn notify_owner<T, F>(&self, transport: &T, build: F) -> usize
    where
        T: Transport + ?Sized,
        F: Fn() -> Notification,
    {
        match self.subscribers.get(OWNER_USER_ID) {
            Some(owner) => deliver_to_subscriber(transport, owner, &build),
            None => {
                debug!("Owner has no active destination, notification dropped");
                0
            }
        }
    }

    /// Deliver to every registered destination, ignoring memberships.
    pub fn broadcast_all<T, F>(&self, transport: &T, build: F) -> usize
    where
        T: Transport + ?Sized,
        F: Fn() -> Notification,
    {
        let mut delivered = 0;
        for dest in self.destinations.iter() {
            if send_one(transport, dest.node_id(), &build()) {
                delivered += 1;
            }
        }
        delivered
    }
}

fn deliver_to_subscriber<T, F>(transport: &T, subscriber: &ActiveSubscriber, build: &F) -> usize
where
    T: Transport + ?Sized,
    F: Fn() -> Notification,
{
    subscriber
        .routes()
        .filter(|route| send_one(transport, &route.node_id, &build()))
        .count()
}

fn send_one<T: Transport + ?Sized>(transport: &T, node_id: &str, notification: &Notification) -> bool {
    match transport.send(node_id, notification) {
        Ok(()) => {
            debug!(channel = ?notification.channel_id(), "Sent {} notification to [{}]", notification.method(), node_id);
            true
        }
        Err(e) => {
            warn!(channel = ?notification.channel_id(), "Dropping {} notification: {}", notification.method(), e);
            false
        }
    }
}
