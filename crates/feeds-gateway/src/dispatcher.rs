use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

use feeds_core::{Transport, TransportError};
use feeds_types::events::{Notification, Outbound, Response};

/// Tracks connected peers and queues outbound frames for them.
///
/// Sends are synchronous so the blocking worker can deliver without touching the runtime.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// node_id -> outbox feeding that peer's socket writer
    outboxes: RwLock<HashMap<String, mpsc::UnboundedSender<Outbound>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new peer connection under a fresh node id.
    pub fn register(&self) -> (String, mpsc::UnboundedReceiver<Outbound>) {
        let node_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .outboxes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(node_id.clone(), tx);
        (node_id, rx)
    }

    pub fn unregister(&self, node_id: &str) {
        self.inner
            .outboxes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(node_id);
    }

    pub fn is_connected(&self, node_id: &str) -> bool {
        self.inner
            .outboxes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(node_id)
    }

    pub fn connected_count(&self) -> usize {
        self.inner.outboxes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn reply(&self, node_id: &str, response: Response) -> Result<(), TransportError> {
        self.push(node_id, Outbound::Response(response))
    }

    fn push(&self, node_id: &str, frame: Outbound) -> Result<(), TransportError> {
        let outboxes = self.inner.outboxes.read().unwrap_or_else(|e| e.into_inner());
        let tx = outboxes
            .get(node_id)
            .ok_or_else(|| TransportError::UnknownNode(node_id.to_string()))?;
        tx.send(frame)
            .map_err(|_| TransportError::Closed(node_id.to_string()))
    }
}

impl Transport for Dispatcher {
    fn send(&self, node_id: &str, notification: &Notification) -> Result<(), TransportError> {
        self.push(node_id, Outbound::Notification(notification.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total_clients: u64) -> Notification {
        Notification::StatisticsChanged { total_clients }
    }

    #[tokio::test]
    async fn notifications_reach_registered_outbox() {
        let dispatcher = Dispatcher::new();
        let (node_id, mut rx) = dispatcher.register();
        assert_eq!(dispatcher.connected_count(), 1);

        dispatcher.send(&node_id, &stats(3)).unwrap();
        match rx.recv().await {
            Some(Outbound::Notification(n)) => assert_eq!(n, stats(3)),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_and_closed_nodes_are_reported() {
        let dispatcher = Dispatcher::new();
        assert_eq!(
            dispatcher.send("ghost", &stats(1)),
            Err(TransportError::UnknownNode("ghost".into()))
        );

        let (node_id, rx) = dispatcher.register();
        drop(rx);
        assert_eq!(
            dispatcher.send(&node_id, &stats(1)),
            Err(TransportError::Closed(node_id.clone()))
        );

        dispatcher.unregister(&node_id);
        assert_eq!(dispatcher.connected_count(), 0);
    }

    #[test]
    fn node_ids_are_unique() {
        let dispatcher = Dispatcher::new();
        let (a, _ra) = dispatcher.register();
        let (b, _rb) = dispatcher.register();
        assert_ne!(a, b);
    }
}
