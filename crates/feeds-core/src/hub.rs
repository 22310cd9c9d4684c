use feeds_types::events::Notification;
use feeds_types::{ChannelInfo, UserInfo};
use tracing::{info, warn};

use crate::channels::{ChannelUpdate, NewChannel};
use crate::error::{FeedsError, Result};
use crate::now_secs;
use crate::registry::FeedsRegistry;
use crate::store::Store;
use crate::transport::Transport;

/// The fan-out graph together with the store it mirrors and the transport it delivers on.
///
/// Every mutating operation writes the store first and only touches the graph once that
/// write succeeded.
pub struct FeedsHub<S, T> {
    registry: FeedsRegistry,
    store: S,
    transport: T,
}

impl<S: Store, T: Transport> FeedsHub<S, T> {
    pub fn new(store: S, transport: T) -> Self {
        Self {
            registry: FeedsRegistry::new(),
            store,
            transport,
        }
    }

    /// Build a hub whose channel registry mirrors every channel in the store.
    pub fn bootstrap(store: S, transport: T) -> Result<Self> {
        let mut hub = Self::new(store, transport);
        let channels = hub.store.load_channels()?;
        let count = channels.len();
        for info in channels {
            hub.registry.channels.load(info)?;
        }
        info!(
            "Feeds registry initialized with {} channels (next id {})",
            count,
            hub.registry.channels.next_id()
        );
        Ok(hub)
    }

    pub fn registry(&self) -> &FeedsRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn channel(&self, id: u64) -> Option<&ChannelInfo> {
        self.registry.channels.get_by_id(id).map(|c| c.info())
    }

    pub fn channel_exists_by_name(&self, name: &str) -> bool {
        self.registry.channels.exists_by_name(name)
    }

    // -- Channels --

    pub fn create_channel(&mut self, new: NewChannel) -> Result<ChannelInfo> {
        let store = &self.store;
        self.registry
            .channels
            .create(new, now_secs(), |info| store.create_channel_record(info))
    }

    pub fn update_channel(&mut self, id: u64, update: ChannelUpdate) -> Result<ChannelInfo> {
        let store = &self.store;
        let info = self
            .registry
            .channels
            .update(id, update, now_secs(), |info| store.update_channel_record(info))?;

        self.notify_channel(id, || Notification::ChannelUpdated(info.clone()));
        Ok(info)
    }

    /// Allocate the channel's next post id and hand it to `persist`. The id is consumed
    /// only if `persist` succeeds.
    pub fn publish_post<F, R>(&mut self, channel_id: u64, now: u64, persist: F) -> Result<R>
    where
        F: FnOnce(u64) -> anyhow::Result<R>,
    {
        let channel = self
            .registry
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| FeedsError::not_exist(format!("channel {channel_id}")))?;

        let post_id = channel.info().next_post_id;
        let persisted = persist(post_id)?;

        let info = channel.info_mut();
        info.next_post_id = post_id + 1;
        info.updated_at = now;
        Ok(persisted)
    }

    /// Record that the channel's content changed at `now`.
    pub fn touch_channel(&mut self, channel_id: u64, now: u64) {
        if let Some(channel) = self.registry.channels.get_mut(channel_id) {
            channel.info_mut().updated_at = now;
        }
    }

    // -- Subscriptions --

    pub fn subscribe(&mut self, user: &UserInfo, channel_id: u64) -> Result<()> {
        let uid = user.uid;
        if !self.registry.channels.exists_by_id(channel_id) {
            return Err(FeedsError::not_exist(format!("channel {channel_id}")));
        }
        if self.store.is_subscribed(uid, channel_id)? {
            return Err(FeedsError::wrong_state(format!(
                "user {uid} already subscribed to channel {channel_id}"
            )));
        }

        self.store.persist_subscribe(uid, channel_id)?;

        if let Some(channel) = self.registry.channels.get_mut(channel_id) {
            channel.info_mut().subscriber_count += 1;
        }
        if self.registry.subscribers.contains(uid) {
            self.registry.link_membership(uid, channel_id);
        }
        info!("User {} subscribed to channel {}", uid, channel_id);

        self.notify_owner(|| Notification::NewSubscription {
            channel_id,
            user: user.clone(),
        });
        Ok(())
    }

    pub fn unsubscribe(&mut self, uid: u64, channel_id: u64) -> Result<()> {
        if !self.registry.channels.exists_by_id(channel_id) {
            return Err(FeedsError::not_exist(format!("channel {channel_id}")));
        }
        if !self.store.is_subscribed(uid, channel_id)? {
            return Err(FeedsError::wrong_state(format!(
                "user {uid} is not subscribed to channel {channel_id}"
            )));
        }

        self.store.persist_unsubscribe(uid, channel_id)?;

        if let Some(channel) = self.registry.channels.get_mut(channel_id) {
            let info = channel.info_mut();
            info.subscriber_count = info.subscriber_count.saturating_sub(1);
        }
        // The user may never have been active, in which case there is nothing to unlink.
        self.registry.unlink_membership(uid, channel_id);
        info!("User {} unsubscribed from channel {}", uid, channel_id);
        Ok(())
    }

    /// Route `uid`'s notifications to `node_id`. Idempotent per (uid, node) pair. The
    /// first route of a subscriber materializes one membership per stored subscription.
    pub fn enable_notification(&mut self, uid: u64, node_id: &str) -> Result<()> {
        if self
            .registry
            .subscribers
            .get(uid)
            .is_some_and(|s| s.has_route(node_id))
        {
            return Ok(());
        }

        let activating = !self.registry.subscribers.contains(uid);
        let subscriptions = if activating {
            self.store.load_subscriptions(uid)?
        } else {
            Vec::new()
        };

        self.registry.subscribers.get_or_create(uid);
        self.registry.destinations.get_or_create(node_id);
        self.registry.link_route(uid, node_id);

        if activating {
            for channel_id in &subscriptions {
                self.registry.link_membership(uid, *channel_id);
            }
            info!(
                "User {} activated on [{}] with {} memberships",
                uid,
                node_id,
                subscriptions.len()
            );
        } else {
            info!("User {} added notification route [{}]", uid, node_id);
        }
        Ok(())
    }

    /// Peer `node_id` went away. Drops its destination and every route through it; a
    /// subscriber left without routes is torn down with all its memberships. Returns the
    /// number of subscribers torn down.
    pub fn deactivate(&mut self, node_id: &str) -> usize {
        let Some(dest) = self.registry.destinations.remove(node_id) else {
            return 0;
        };

        let mut torn_down = 0;
        for route in dest.into_routes() {
            let now_empty = match self.registry.subscribers.get_mut(route.uid) {
                Some(subscriber) => {
                    subscriber.remove_route(node_id);
                    subscriber.route_count() == 0
                }
                None => {
                    warn!("Route [{}] -> {} had no subscriber", node_id, route.uid);
                    false
                }
            };
            if now_empty {
                self.registry.teardown_subscriber(route.uid);
                torn_down += 1;
            }
        }

        info!("Destination [{}] deactivated", node_id);
        torn_down
    }

    // -- Delivery --

    pub fn notify_channel<F>(&self, channel_id: u64, build: F) -> usize
    where
        F: Fn() -> Notification,
    {
        self.registry.notify_channel(&self.transport, channel_id, build)
    }

    pub fn notify_owner<F>(&self, build: F) -> usize
    where
        F: Fn() -> Notification,
    {
        self.registry.notify_owner(&self.transport, build)
    }

    pub fn broadcast_all<F>(&self, build: F) -> usize
    where
        F: Fn() -> Notification,
    {
        self.registry.broadcast_all(&self.transport, build)
    }

    /// Tell every connected destination the registered user count changed.
    pub fn broadcast_statistics(&self) -> Result<usize> {
        let total_clients = self.store.user_count()?;
        Ok(self.broadcast_all(|| Notification::StatisticsChanged { total_clients }))
    }
}
