//! Peer transport: WebSocket connections, per-node outboxes and the single worker that owns
//! the feeds registry.

pub mod connection;
pub mod dispatcher;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use worker::{Job, RequestHandler, WorkerHandle};
