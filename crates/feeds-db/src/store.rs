use anyhow::Result;
use feeds_core::Store;
use feeds_types::ChannelInfo;

use crate::Database;

impl Store for Database {
    fn persist_subscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        self.subscribe(uid, channel_id)
    }

    fn persist_unsubscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        self.unsubscribe(uid, channel_id)
    }

    fn is_subscribed(&self, uid: u64, channel_id: u64) -> Result<bool> {
        Database::is_subscribed(self, uid, channel_id)
    }

    fn load_subscriptions(&self, uid: u64) -> Result<Vec<u64>> {
        self.subscriptions_of(uid)
    }

    fn load_channels(&self) -> Result<Vec<ChannelInfo>> {
        Database::load_channels(self)
    }

    fn create_channel_record(&self, info: &ChannelInfo) -> Result<()> {
        self.insert_channel(info)
    }

    fn update_channel_record(&self, info: &ChannelInfo) -> Result<()> {
        self.update_channel(info)
    }

    fn user_count(&self) -> Result<u64> {
        self.count_users()
    }
}
