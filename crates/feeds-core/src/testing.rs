//! In-memory collaborators for exercising the hub without a database or sockets.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::{Result, bail};
use feeds_types::events::Notification;
use feeds_types::{ChannelInfo, UserInfo};

use crate::store::Store;
use crate::transport::{Transport, TransportError};

pub fn user(uid: u64) -> UserInfo {
    UserInfo {
        uid,
        did: format!("did:elastos:user{uid}"),
        name: format!("user{uid}"),
        email: String::new(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    subscriptions: RefCell<BTreeSet<(u64, u64)>>,
    channels: RefCell<BTreeMap<u64, ChannelInfo>>,
    users: Cell<u64>,
    loads: Cell<usize>,
    failing: Cell<bool>,
}

impl MemoryStore {
    /// Make every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn set_user_count(&self, n: u64) {
        self.users.set(n);
    }

    pub fn subscription_loads(&self) -> usize {
        self.loads.get()
    }

    pub fn channel(&self, id: u64) -> Option<ChannelInfo> {
        self.channels.borrow().get(&id).cloned()
    }

    fn check(&self) -> Result<()> {
        if self.failing.get() {
            bail!("store unavailable");
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn persist_subscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        self.check()?;
        self.subscriptions.borrow_mut().insert((uid, channel_id));
        Ok(())
    }

    fn persist_unsubscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        self.check()?;
        self.subscriptions.borrow_mut().remove(&(uid, channel_id));
        Ok(())
    }

    fn is_subscribed(&self, uid: u64, channel_id: u64) -> Result<bool> {
        self.check()?;
        Ok(self.subscriptions.borrow().contains(&(uid, channel_id)))
    }

    fn load_subscriptions(&self, uid: u64) -> Result<Vec<u64>> {
        self.check()?;
        self.loads.set(self.loads.get() + 1);
        Ok(self
            .subscriptions
            .borrow()
            .iter()
            .filter(|(u, _)| *u == uid)
            .map(|(_, c)| *c)
            .collect())
    }

    fn load_channels(&self) -> Result<Vec<ChannelInfo>> {
        self.check()?;
        Ok(self.channels.borrow().values().cloned().collect())
    }

    fn create_channel_record(&self, info: &ChannelInfo) -> Result<()> {
        self.check()?;
        self.channels.borrow_mut().insert(info.id, info.clone());
        Ok(())
    }

    fn update_channel_record(&self, info: &ChannelInfo) -> Result<()> {
        self.check()?;
        self.channels.borrow_mut().insert(info.id, info.clone());
        Ok(())
    }

    fn user_count(&self) -> Result<u64> {
        self.check()?;
        Ok(self.users.get())
    }
}

/// Records every delivered notification. Nodes marked disconnected reject sends.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: RefCell<Vec<(String, Notification)>>,
    offline: RefCell<HashSet<String>>,
}

impl RecordingTransport {
    pub fn disconnect(&self, node_id: &str) {
        self.offline.borrow_mut().insert(node_id.to_string());
    }

    pub fn sent_to(&self, node_id: &str) -> Vec<Notification> {
        self.sent
            .borrow()
            .iter()
            .filter(|(n, _)| n == node_id)
            .map(|(_, notification)| notification.clone())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, node_id: &str, notification: &Notification) -> Result<(), TransportError> {
        if self.offline.borrow().contains(node_id) {
            return Err(TransportError::UnknownNode(node_id.to_string()));
        }
        self.sent
            .borrow_mut()
            .push((node_id.to_string(), notification.clone()));
        Ok(())
    }
}
