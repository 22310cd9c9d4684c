use std::sync::Arc;

use feeds_types::events::Notification;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("node {0} is not connected")]
    UnknownNode(String),

    #[error("outbox for node {0} is closed")]
    Closed(String),
}

/// Fire-and-forget delivery to a peer node.
pub trait Transport {
    fn send(&self, node_id: &str, notification: &Notification) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, node_id: &str, notification: &Notification) -> Result<(), TransportError> {
        (**self).send(node_id, notification)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, node_id: &str, notification: &Notification) -> Result<(), TransportError> {
        (**self).send(node_id, notification)
    }
}
