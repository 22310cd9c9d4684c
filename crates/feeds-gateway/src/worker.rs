use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use feeds_api::FeedsService;
use feeds_core::Transport;
use feeds_types::events::{Request, Response};

use crate::dispatcher::Dispatcher;

/// Work for the request-processing thread.
#[derive(Debug)]
pub enum Job {
    Request { node_id: String, request: Request },
    Disconnected { node_id: String },
}

/// Whatever owns the feeds state. Runs every job to completion before the next one.
pub trait RequestHandler: Send + 'static {
    fn handle(&mut self, node_id: &str, request: Request) -> Response;
    fn disconnected(&mut self, node_id: &str);
}

impl<T: Transport + Send + 'static> RequestHandler for FeedsService<T> {
    fn handle(&mut self, node_id: &str, request: Request) -> Response {
        FeedsService::handle(self, node_id, request)
    }

    fn disconnected(&mut self, node_id: &str) {
        FeedsService::disconnected(self, node_id)
    }
}

#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl WorkerHandle {
    /// Queue a job. Returns false once the worker has stopped.
    pub fn submit(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// Move `handler` onto a blocking thread that drains the job queue. Responses go back
/// through `dispatcher`; the thread exits when every handle is dropped.
pub fn spawn<H: RequestHandler>(handler: H, dispatcher: Dispatcher) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::task::spawn_blocking(move || run(handler, dispatcher, rx));
    (WorkerHandle { tx }, task)
}

fn run<H: RequestHandler>(mut handler: H, dispatcher: Dispatcher, mut rx: mpsc::UnboundedReceiver<Job>) {
    info!("Feeds worker started");

    while let Some(job) = rx.blocking_recv() {
        match job {
            Job::Request { node_id, request } => {
                // The socket may close between decode and submit.
                if !dispatcher.is_connected(&node_id) {
                    debug!("Dropping {} from departed node [{}]", request.call.method(), node_id);
                    continue;
                }
                let response = handler.handle(&node_id, request);
                if let Err(e) = dispatcher.reply(&node_id, response) {
                    debug!("Response dropped: {}", e);
                }
            }
            Job::Disconnected { node_id } => handler.disconnected(&node_id),
        }
    }

    info!("Feeds worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use feeds_types::api::Reply;
    use feeds_types::events::{Call, Outbound};

    use super::*;

    #[derive(Clone, Default)]
    struct Echo {
        handled: Arc<Mutex<Vec<u64>>>,
        disconnected: Arc<Mutex<Vec<String>>>,
    }

    impl RequestHandler for Echo {
        fn handle(&mut self, _node_id: &str, request: Request) -> Response {
            self.handled.lock().unwrap().push(request.id);
            Response::ok(request.id, &Reply::Id { id: request.id })
        }

        fn disconnected(&mut self, node_id: &str) {
            self.disconnected.lock().unwrap().push(node_id.to_string());
        }
    }

    fn request(id: u64) -> Request {
        Request {
            id,
            access_token: String::new(),
            call: Call::GetStatistics,
        }
    }

    #[tokio::test]
    async fn responses_return_to_the_requesting_node() {
        let dispatcher = Dispatcher::new();
        let (node_id, mut rx) = dispatcher.register();
        let (worker, task) = spawn(Echo::default(), dispatcher.clone());

        for id in [7, 8] {
            assert!(worker.submit(Job::Request {
                node_id: node_id.clone(),
                request: request(id),
            }));
        }

        for id in [7, 8] {
            match rx.recv().await {
                Some(Outbound::Response(resp)) => {
                    assert_eq!(resp.id, id);
                    assert_eq!(resp.result.unwrap()["id"], id);
                }
                other => panic!("unexpected frame: {other:?}"),
            }
        }

        drop(worker);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn disconnects_are_forwarded_in_order() {
        let echo = Echo::default();
        let seen = echo.disconnected.clone();
        let (worker, task) = spawn(echo, Dispatcher::new());

        worker.submit(Job::Request {
            node_id: "gone".into(),
            request: request(1),
        });
        worker.submit(Job::Disconnected { node_id: "a".into() });
        worker.submit(Job::Disconnected { node_id: "b".into() });
        drop(worker);
        task.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn requests_from_departed_nodes_are_dropped() {
        let echo = Echo::default();
        let handled = echo.handled.clone();
        let dispatcher = Dispatcher::new();
        let (live, _live_rx) = dispatcher.register();
        let (gone, _gone_rx) = dispatcher.register();
        dispatcher.unregister(&gone);
        let (worker, task) = spawn(echo, dispatcher.clone());

        worker.submit(Job::Disconnected { node_id: gone.clone() });
        worker.submit(Job::Request {
            node_id: gone,
            request: request(1),
        });
        worker.submit(Job::Request {
            node_id: live,
            request: request(2),
        });
        drop(worker);
        task.await.unwrap();

        assert_eq!(*handled.lock().unwrap(), vec![2]);
    }
}
