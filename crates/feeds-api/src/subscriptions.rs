use feeds_core::{Result, Transport};
use feeds_types::UserInfo;
use feeds_types::api::Reply;

use crate::FeedsService;

impl<T: Transport> FeedsService<T> {
    pub fn subscribe_channel(&mut self, user: &UserInfo, channel_id: u64) -> Result<Reply> {
        self.hub.subscribe(user, channel_id)?;
        Ok(Reply::empty())
    }

    pub fn unsubscribe_channel(&mut self, user: &UserInfo, channel_id: u64) -> Result<Reply> {
        self.hub.unsubscribe(user.uid, channel_id)?;
        Ok(Reply::empty())
    }

    /// Start pushing the user's notifications to the node the request arrived on.
    pub fn enable_notification(&mut self, user: &UserInfo, node_id: &str) -> Result<Reply> {
        self.hub.enable_notification(user.uid, node_id)?;
        Ok(Reply::empty())
    }
}
