use std::collections::HashMap;

/// Join record: channel `channel_id` fans out to active subscriber `uid`.
///
/// Linked from both `Channel::memberships` and `ActiveSubscriber::memberships`; the two
/// links are always added and removed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub channel_id: u64,
    pub uid: u64,
}

/// Join record: active subscriber `uid` is reachable through peer node `node_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub uid: u64,
    pub node_id: String,
}

/// A user with at least one live notification destination.
#[derive(Debug)]
pub struct ActiveSubscriber {
    uid: u64,
    memberships: HashMap<u64, Membership>,
    routes: HashMap<String, Route>,
}

impl ActiveSubscriber {
    fn new(uid: u64) -> Self {
        Self {
            uid,
            memberships: HashMap::new(),
            routes: HashMap::new(),
        }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn memberships(&self) -> impl Iterator<Item = &Membership> {
        self.memberships.values()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn membership_count(&self) -> usize {
        self.memberships.len()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn has_membership(&self, channel_id: u64) -> bool {
        self.memberships.contains_key(&channel_id)
    }

    pub fn has_route(&self, node_id: &str) -> bool {
        self.routes.contains_key(node_id)
    }

    pub(crate) fn insert_membership(&mut self, membership: Membership) {
        self.memberships.insert(membership.channel_id, membership);
    }

    pub(crate) fn remove_membership(&mut self, channel_id: u64) -> Option<Membership> {
        self.memberships.remove(&channel_id)
    }

    pub(crate) fn take_memberships(&mut self) -> Vec<Membership> {
        self.memberships.drain().map(|(_, m)| m).collect()
    }

    pub(crate) fn insert_route(&mut self, route: Route) {
        self.routes.insert(route.node_id.clone(), route);
    }

    pub(crate) fn remove_route(&mut self, node_id: &str) -> Option<Route> {
        self.routes.remove(node_id)
    }
}

/// Active subscribers by uid. Records are created only through [`get_or_create`] and
/// must be removed by the caller once their routes are empty.
///
/// [`get_or_create`]: SubscriberRegistry::get_or_create
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    by_uid: HashMap<u64, ActiveSubscriber>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uid: u64) -> Option<&ActiveSubscriber> {
        self.by_uid.get(&uid)
    }

    pub fn contains(&self, uid: u64) -> bool {
        self.by_uid.contains_key(&uid)
    }

    /// Returns the subscriber and whether this call created it.
    pub fn get_or_create(&mut self, uid: u64) -> (&mut ActiveSubscriber, bool) {
        let mut created = false;
        let subscriber = self.by_uid.entry(uid).or_insert_with(|| {
            created = true;
            ActiveSubscriber::new(uid)
        });
        (subscriber, created)
    }

    pub fn remove(&mut self, uid: u64) -> Option<ActiveSubscriber> {
        self.by_uid.remove(&uid)
    }

    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveSubscriber> {
        self.by_uid.values()
    }

    pub(crate) fn get_mut(&mut self, uid: u64) -> Option<&mut ActiveSubscriber> {
        self.by_uid.get_mut(&uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_reports_creation_once() {
        let mut reg = SubscriberRegistry::new();
        assert!(reg.get_or_create(2).1);
        assert!(!reg.get_or_create(2).1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn routes_are_keyed_by_node() {
        let mut reg = SubscriberRegistry::new();
        let (sub, _) = reg.get_or_create(2);
        sub.insert_route(Route {
            uid: 2,
            node_id: "n1".into(),
        });
        sub.insert_route(Route {
            uid: 2,
            node_id: "n1".into(),
        });
        assert_eq!(sub.route_count(), 1);
        assert!(sub.remove_route("n1").is_some());
        assert_eq!(sub.route_count(), 0);
    }
}
