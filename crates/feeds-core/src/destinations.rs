use std::collections::HashMap;

use crate::subscribers::Route;

/// One peer connection able to receive pushed notifications.
#[derive(Debug)]
pub struct NotificationDestination {
    node_id: String,
    routes: Vec<Route>,
}

impl NotificationDestination {
    fn new(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            routes: Vec::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub(crate) fn push_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub(crate) fn remove_route(&mut self, uid: u64) -> bool {
        let before = self.routes.len();
        self.routes.retain(|r| r.uid != uid);
        self.routes.len() != before
    }

    pub(crate) fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}

/// Notification destinations by peer node id.
#[derive(Debug, Default)]
pub struct DestinationRegistry {
    by_node: HashMap<String, NotificationDestination>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node_id: &str) -> Option<&NotificationDestination> {
        self.by_node.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.by_node.contains_key(node_id)
    }

    pub fn get_or_create(&mut self, node_id: &str) -> (&mut NotificationDestination, bool) {
        let mut created = false;
        let dest = self
            .by_node
            .entry(node_id.to_string())
            .or_insert_with(|| {
                created = true;
                NotificationDestination::new(node_id)
            });
        (dest, created)
    }

    pub fn remove(&mut self, node_id: &str) -> Option<NotificationDestination> {
        self.by_node.remove(node_id)
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NotificationDestination> {
        self.by_node.values()
    }

    pub(crate) fn get_mut(&mut self, node_id: &str) -> Option<&mut NotificationDestination> {
        self.by_node.get_mut(node_id)
    }
}
