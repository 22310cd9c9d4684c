use std::sync::Arc;

use anyhow::Result;
use feeds_types::ChannelInfo;

/// Persistence collaborator. Every call is synchronous; a failure aborts the calling
/// operation before any in-memory state is touched.
pub trait Store {
    fn persist_subscribe(&self, uid: u64, channel_id: u64) -> Result<()>;
    fn persist_unsubscribe(&self, uid: u64, channel_id: u64) -> Result<()>;
    fn is_subscribed(&self, uid: u64, channel_id: u64) -> Result<bool>;
    fn load_subscriptions(&self, uid: u64) -> Result<Vec<u64>>;
    fn load_channels(&self) -> Result<Vec<ChannelInfo>>;
    fn create_channel_record(&self, info: &ChannelInfo) -> Result<()>;
    fn update_channel_record(&self, info: &ChannelInfo) -> Result<()>;
    fn user_count(&self) -> Result<u64>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn persist_subscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        (**self).persist_subscribe(uid, channel_id)
    }

    fn persist_unsubscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        (**self).persist_unsubscribe(uid, channel_id)
    }

    fn is_subscribed(&self, uid: u64, channel_id: u64) -> Result<bool> {
        (**self).is_subscribed(uid, channel_id)
    }

    fn load_subscriptions(&self, uid: u64) -> Result<Vec<u64>> {
        (**self).load_subscriptions(uid)
    }

    fn load_channels(&self) -> Result<Vec<ChannelInfo>> {
        (**self).load_channels()
    }

    fn create_channel_record(&self, info: &ChannelInfo) -> Result<()> {
        (**self).create_channel_record(info)
    }

    fn update_channel_record(&self, info: &ChannelInfo) -> Result<()> {
        (**self).update_channel_record(info)
    }

    fn user_count(&self) -> Result<u64> {
        (**self).user_count()
    }
}
