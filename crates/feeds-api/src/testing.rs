use std::cell::RefCell;
use std::sync::Arc;

use feeds_core::{Transport, TransportError};
use feeds_db::Database;
use feeds_types::events::{Call, Notification, Request, Response};

use crate::{FeedsService, ServiceConfig};

const SECRET: &str = "test-secret";
const OWNER_DID: &str = "did:elastos:owner";

#[derive(Default)]
pub struct RecordingTransport {
    sent: RefCell<Vec<(String, Notification)>>,
}

impl Transport for RecordingTransport {
    fn send(&self, node_id: &str, notification: &Notification) -> Result<(), TransportError> {
        self.sent
            .borrow_mut()
            .push((node_id.to_string(), notification.clone()));
        Ok(())
    }
}

/// A service over an in-memory database, driven through `handle` like the gateway does.
/// The owner always talks from node "N0".
pub struct Harness {
    pub service: FeedsService<RecordingTransport>,
    owner_token: String,
    next_request: u64,
}

impl Harness {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let service = FeedsService::new(
            db,
            RecordingTransport::default(),
            ServiceConfig {
                jwt_secret: SECRET.into(),
                owner_did: OWNER_DID.into(),
                owner_name: "owner".into(),
                service_did: OWNER_DID.into(),
            },
        )
        .unwrap();
        let owner_token = service
            .authenticator()
            .issue(OWNER_DID, "owner", "", chrono::Duration::hours(1))
            .unwrap();

        Self {
            service,
            owner_token,
            next_request: 1,
        }
    }

    pub fn token(&self, name: &str) -> String {
        self.service
            .authenticator()
            .issue(&format!("did:elastos:{name}"), name, "", chrono::Duration::hours(1))
            .unwrap()
    }

    pub fn call(&mut self, node: &str, token: &str, call: Call) -> Response {
        let id = self.next_request;
        self.next_request += 1;
        let resp = self.service.handle(
            node,
            Request {
                id,
                access_token: token.to_string(),
                call,
            },
        );
        assert_eq!(resp.id, id);
        resp
    }

    pub fn owner_call(&mut self, node: &str, call: Call) -> Response {
        let token = self.owner_token.clone();
        self.call(node, &token, call)
    }

    pub fn ok(&mut self, node: &str, token: &str, call: Call) -> serde_json::Value {
        let method = call.method();
        let resp = self.call(node, token, call);
        match (resp.result, resp.error) {
            (Some(result), None) => result,
            (_, error) => panic!("{method} failed: {error:?}"),
        }
    }

    pub fn owner_ok(&mut self, node: &str, call: Call) -> serde_json::Value {
        let token = self.owner_token.clone();
        self.ok(node, &token, call)
    }

    pub fn create_channel(&mut self, name: &str) -> u64 {
        let reply = self.owner_ok(
            "N0",
            Call::CreateChannel {
                name: name.into(),
                intro: format!("{name} intro"),
                avatar: vec![],
            },
        );
        reply["id"].as_u64().unwrap()
    }

    pub fn publish(&mut self, channel_id: u64, content: &[u8]) -> u64 {
        let reply = self.owner_ok(
            "N0",
            Call::PublishPost {
                channel_id,
                content: content.to_vec(),
            },
        );
        reply["id"].as_u64().unwrap()
    }

    pub fn error_code(resp: &Response) -> Option<&str> {
        resp.error.as_ref().map(|e| e.code.as_str())
    }

    pub fn notifications(&self, node: &str) -> Vec<Notification> {
        self.service
            .hub()
            .transport()
            .sent
            .borrow()
            .iter()
            .filter(|(n, _)| n == node)
            .map(|(_, notification)| notification.clone())
            .collect()
    }
}
