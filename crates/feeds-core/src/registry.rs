use tracing::{debug, info, warn};

use crate::channels::ChannelRegistry;
use crate::destinations::DestinationRegistry;
use crate::subscribers::{ActiveSubscriber, Membership, Route, SubscriberRegistry};

/// The whole fan-out graph. Owned by a single request-processing task; every mutation of
/// a join record goes through the link/unlink helpers below so both sides stay in step.
#[derive(Debug, Default)]
pub struct FeedsRegistry {
    pub(crate) channels: ChannelRegistry,
    pub(crate) subscribers: SubscriberRegistry,
    pub(crate) destinations: DestinationRegistry,
}

impl FeedsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn subscribers(&self) -> &SubscriberRegistry {
        &self.subscribers
    }

    pub fn destinations(&self) -> &DestinationRegistry {
        &self.destinations
    }

    pub fn subscriber(&self, uid: u64) -> Option<&ActiveSubscriber> {
        self.subscribers.get(uid)
    }

    /// Total number of memberships, counted from the channel side.
    pub fn membership_count(&self) -> usize {
        self.channels.iter().map(|c| c.memberships().len()).sum()
    }

    /// Total number of routes, counted from the destination side.
    pub fn route_count(&self) -> usize {
        self.destinations.iter().map(|d| d.routes().len()).sum()
    }

    /// Link channel `channel_id` to active subscriber `uid`. No-op if either hub is
    /// missing or the membership already exists.
    pub(crate) fn link_membership(&mut self, uid: u64, channel_id: u64) -> bool {
        let Some(subscriber) = self.subscribers.get_mut(uid) else {
            return false;
        };
        let Some(channel) = self.channels.get_mut(channel_id) else {
            warn!("Skipping membership of {} in unknown channel {}", uid, channel_id);
            return false;
        };
        if subscriber.has_membership(channel_id) {
            return false;
        }

        let membership = Membership { channel_id, uid };
        channel.push_membership(membership.clone());
        subscriber.insert_membership(membership);
        debug!("Linked subscriber {} to channel {}", uid, channel_id);
        true
    }

    /// Remove the membership from both sides. Returns false if there was none.
    pub(crate) fn unlink_membership(&mut self, uid: u64, channel_id: u64) -> bool {
        let Some(subscriber) = self.subscribers.get_mut(uid) else {
            return false;
        };
        if subscriber.remove_membership(channel_id).is_none() {
            return false;
        }
        if let Some(channel) = self.channels.get_mut(channel_id) {
            channel.remove_membership(uid);
        }
        debug!("Unlinked subscriber {} from channel {}", uid, channel_id);
        true
    }

    /// Link an existing subscriber and destination. Both must already be registered.
    pub(crate) fn link_route(&mut self, uid: u64, node_id: &str) -> bool {
        let Some(subscriber) = self.subscribers.get_mut(uid) else {
            return false;
        };
        let Some(dest) = self.destinations.get_mut(node_id) else {
            return false;
        };
        if subscriber.has_route(node_id) {
            return false;
        }

        let route = Route {
            uid,
            node_id: node_id.to_string(),
        };
        dest.push_route(route.clone());
        subscriber.insert_route(route);
        true
    }

    /// Remove every link of `uid`: memberships from their channels, routes from their
    /// destinations (dropping destinations left empty), then the subscriber itself.
    pub(crate) fn teardown_subscriber(&mut self, uid: u64) {
        let Some(mut subscriber) = self.subscribers.remove(uid) else {
            return;
        };

        let memberships = subscriber.take_memberships();
        for m in &memberships {
            if let Some(channel) = self.channels.get_mut(m.channel_id) {
                channel.remove_membership(uid);
            }
        }

        let nodes: Vec<String> = subscriber.routes().map(|r| r.node_id.clone()).collect();
        for node_id in nodes {
            subscriber.remove_route(&node_id);
            let now_empty = match self.destinations.get_mut(&node_id) {
                Some(dest) => {
                    dest.remove_route(uid);
                    dest.routes().is_empty()
                }
                None => false,
            };
            if now_empty {
                self.destinations.remove(&node_id);
            }
        }

        info!(
            "Active subscriber {} torn down ({} memberships released)",
            uid,
            memberships.len()
        );
    }

    /// Check every cross-index invariant of the graph.
    pub fn verify(&self) -> Result<(), String> {
        if self.channels.name_index_len() != self.channels.len() {
            return Err("name index and id index disagree".into());
        }
        for channel in self.channels.iter() {
            match self.channels.get_by_name(channel.name()) {
                Some(c) if c.id() == channel.id() => {}
                _ => return Err(format!("channel {} not resolvable by name", channel.id())),
            }
            for m in channel.memberships() {
                let linked = self
                    .subscribers
                    .get(m.uid)
                    .is_some_and(|s| s.has_membership(channel.id()));
                if !linked {
                    return Err(format!(
                        "channel {} lists member {} without a back link",
                        channel.id(),
                        m.uid
                    ));
                }
            }
        }

        for subscriber in self.subscribers.iter() {
            if subscriber.route_count() == 0 {
                return Err(format!("subscriber {} has no routes", subscriber.uid()));
            }
            for m in subscriber.memberships() {
                let linked = self
                    .channels
                    .get_by_id(m.channel_id)
                    .is_some_and(|c| c.has_member(subscriber.uid()));
                if !linked {
                    return Err(format!(
                        "subscriber {} holds membership {} unknown to the channel",
                        subscriber.uid(),
                        m.channel_id
                    ));
                }
            }
            for r in subscriber.routes() {
                let linked = self
                    .destinations
                    .get(&r.node_id)
                    .is_some_and(|d| d.routes().iter().any(|dr| dr.uid == subscriber.uid()));
                if !linked {
                    return Err(format!(
                        "subscriber {} routes to {} without a back link",
                        subscriber.uid(),
                        r.node_id
                    ));
                }
            }
        }

        for dest in self.destinations.iter() {
            if dest.routes().is_empty() {
                return Err(format!("destination {} has no routes", dest.node_id()));
            }
            for r in dest.routes() {
                let linked = self
                    .subscribers
                    .get(r.uid)
                    .is_some_and(|s| s.has_route(dest.node_id()));
                if !linked {
                    return Err(format!(
                        "destination {} lists subscriber {} without a back link",
                        dest.node_id(),
                        r.uid
                    ));
                }
            }
        }

        Ok(())
    }
}
