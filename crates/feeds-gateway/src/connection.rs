use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use feeds_types::events::Request;

use crate::dispatcher::Dispatcher;
use crate::worker::{Job, WorkerHandle};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Serve one peer: requests go to the worker, responses and notifications come back
/// through the node's outbox. On exit the worker is told the node is gone.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, worker: WorkerHandle) {
    let (mut sender, mut receiver) = socket.split();
    let (node_id, mut outbox) = dispatcher.register();
    info!("Peer [{}] connected", node_id);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    let send_node = node_id.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                frame = outbox.recv() => {
                    let Some(frame) = frame else { break };
                    let text = match serde_json::to_string(&frame) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("[{}] failed to encode frame: {}", send_node, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("[{}] heartbeat timeout (missed {} pongs), dropping connection", send_node, missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let recv_node = node_id.clone();
    let recv_worker = worker.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<Request>(&text) {
                    Ok(request) => {
                        let job = Job::Request {
                            node_id: recv_node.clone(),
                            request,
                        };
                        if !recv_worker.submit(job) {
                            warn!("Feeds worker is gone, closing [{}]", recv_node);
                            break;
                        }
                    }
                    Err(e) => {
                        let raw: String = text.chars().take(200).collect();
                        warn!("[{}] bad request: {} -- raw: {}", recv_node, e, raw);
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish, then for the other to stop, so no request from
    // this node can be queued behind its Disconnected job.
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }

    dispatcher.unregister(&node_id);
    worker.submit(Job::Disconnected {
        node_id: node_id.clone(),
    });
    info!("Peer [{}] disconnected", node_id);
}
