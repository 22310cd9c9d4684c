use std::collections::HashMap;

use feeds_types::ChannelInfo;
use feeds_types::models::{CHANNEL_ID_START, POST_ID_START};
use tracing::{debug, info};

use crate::error::{FeedsError, Result};
use crate::subscribers::Membership;

/// A live channel: its canonical record plus the fan-out list of active subscribers.
#[derive(Debug)]
pub struct Channel {
    info: ChannelInfo,
    memberships: Vec<Membership>,
}

impl Channel {
    fn new(info: ChannelInfo) -> Self {
        Self {
            info,
            memberships: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &ChannelInfo {
        &self.info
    }

    /// Active subscribers this channel fans out to, in link order.
    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    pub(crate) fn has_member(&self, uid: u64) -> bool {
        self.memberships.iter().any(|m| m.uid == uid)
    }

    pub(crate) fn push_membership(&mut self, membership: Membership) {
        self.memberships.push(membership);
    }

    pub(crate) fn remove_membership(&mut self, uid: u64) -> bool {
        let before = self.memberships.len();
        self.memberships.retain(|m| m.uid != uid);
        self.memberships.len() != before
    }

    pub(crate) fn info_mut(&mut self) -> &mut ChannelInfo {
        &mut self.info
    }
}

/// Fields supplied by the owner when creating a channel.
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub intro: String,
    pub owner_uid: u64,
    pub avatar: Vec<u8>,
}

/// Replacement fields for an existing channel. The id never changes.
#[derive(Debug, Clone)]
pub struct ChannelUpdate {
    pub name: String,
    pub intro: String,
    pub avatar: Vec<u8>,
}

/// Channels indexed by id and by unique name.
///
/// `by_id` owns the channel; `by_name` maps each live name to its id, so both indices
/// always describe exactly the same channel set.
#[derive(Debug)]
pub struct ChannelRegistry {
    by_id: HashMap<u64, Channel>,
    by_name: HashMap<String, u64>,
    next_id: u64,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            next_id: CHANNEL_ID_START,
        }
    }

    /// Insert a channel loaded from the store at startup. Keeps `next_id` past every
    /// loaded id so ids are never reused.
    pub fn load(&mut self, info: ChannelInfo) -> Result<()> {
        if self.by_name.contains_key(&info.name) {
            return Err(FeedsError::already_exists(format!("channel name {}", info.name)));
        }
        if self.by_id.contains_key(&info.id) {
            return Err(FeedsError::already_exists(format!("channel {}", info.id)));
        }

        if info.id >= self.next_id {
            self.next_id = info.id + 1;
        }

        debug!("Loaded channel {} ({})", info.id, info.name);
        self.insert(Channel::new(info));
        Ok(())
    }

    /// Id the next created channel will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Create a channel. `persist` runs with the fully built record before anything is
    /// indexed; if it fails the registry is left untouched and the id is not consumed.
    pub fn create<F>(&mut self, new: NewChannel, now: u64, persist: F) -> Result<ChannelInfo>
    where
        F: FnOnce(&ChannelInfo) -> anyhow::Result<()>,
    {
        if self.exists_by_name(&new.name) {
            return Err(FeedsError::already_exists(format!("channel name {}", new.name)));
        }

        let info = ChannelInfo {
            id: self.next_id,
            name: new.name,
            intro: new.intro,
            owner_uid: new.owner_uid,
            created_at: now,
            updated_at: now,
            subscriber_count: 0,
            next_post_id: POST_ID_START,
            avatar: new.avatar,
        };

        persist(&info)?;

        self.next_id += 1;
        self.insert(Channel::new(info.clone()));
        info!("Channel {} ({}) created", info.id, info.name);

        Ok(info)
    }

    pub fn get_by_id(&self, id: u64) -> Option<&Channel> {
        self.by_id.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Channel> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    pub fn exists_by_id(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Copy-on-write update. The replacement takes over the old value's membership list,
    /// then both index entries are swapped in one step.
    pub fn update<F>(
        &mut self,
        id: u64,
        update: ChannelUpdate,
        now: u64,
        persist: F,
    ) -> Result<ChannelInfo>
    where
        F: FnOnce(&ChannelInfo) -> anyhow::Result<()>,
    {
        let current = self
            .by_id
            .get(&id)
            .ok_or_else(|| FeedsError::not_exist(format!("channel {id}")))?;

        if update.name != current.info.name && self.exists_by_name(&update.name) {
            return Err(FeedsError::already_exists(format!("channel name {}", update.name)));
        }

        let info = ChannelInfo {
            name: update.name,
            intro: update.intro,
            avatar: update.avatar,
            updated_at: now,
            ..current.info.clone()
        };

        persist(&info)?;

        let Some(old) = self.by_id.remove(&id) else {
            return Err(FeedsError::not_exist(format!("channel {id}")));
        };
        self.by_name.remove(&old.info.name);

        let replacement = Channel {
            info,
            memberships: old.memberships,
        };
        let updated = replacement.info.clone();
        self.insert(replacement);
        info!("Channel {} updated ({})", id, updated.name);

        Ok(updated)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.by_id.values()
    }

    pub(crate) fn get_mut(&mut self, id: u64) -> Option<&mut Channel> {
        self.by_id.get_mut(&id)
    }

    pub(crate) fn name_index_len(&self) -> usize {
        self.by_name.len()
    }

    fn insert(&mut self, channel: Channel) {
        self.by_name.insert(channel.info.name.clone(), channel.info.id);
        self.by_id.insert(channel.info.id, channel);
    }
}
