use feeds_core::{ChannelUpdate, NewChannel, Result, Transport};
use feeds_types::UserInfo;
use feeds_types::api::Reply;

use crate::FeedsService;

impl<T: Transport> FeedsService<T> {
    pub fn create_channel(&mut self, user: &UserInfo, name: String, intro: String, avatar: Vec<u8>) -> Result<Reply> {
        self.require_owner(user)?;

        let info = self.hub.create_channel(NewChannel {
            name,
            intro,
            owner_uid: user.uid,
            avatar,
        })?;

        Ok(Reply::Id { id: info.id })
    }

    /// Replace a channel's descriptive fields and tell its subscribers.
    pub fn update_channel(
        &mut self,
        user: &UserInfo,
        id: u64,
        name: String,
        intro: String,
        avatar: Vec<u8>,
    ) -> Result<Reply> {
        self.require_owner(user)?;
        self.hub.update_channel(id, ChannelUpdate { name, intro, avatar })?;
        Ok(Reply::empty())
    }
}
