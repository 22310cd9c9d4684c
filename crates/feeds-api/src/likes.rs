use feeds_core::{FeedsError, Result, Transport, now_secs};
use feeds_types::api::Reply;
use feeds_types::events::Notification;
use feeds_types::{LikeInfo, UserInfo};

use crate::FeedsService;

/// `new_like` goes out only when the running total reaches a multiple of this.
const LIKE_ANNOUNCE_STEP: u64 = 10;

impl<T: Transport> FeedsService<T> {
    /// Like a post (`comment_id == 0`) or one of its comments.
    pub fn post_like(&mut self, user: &UserInfo, channel_id: u64, post_id: u64, comment_id: u64) -> Result<Reply> {
        self.require_likeable(channel_id, post_id, comment_id)?;

        let total_count = self
            .db
            .add_like(user.uid, channel_id, post_id, comment_id, now_secs())?
            .ok_or_else(|| FeedsError::wrong_state(format!("user {} already liked it", user.uid)))?;

        if total_count % LIKE_ANNOUNCE_STEP == 0 {
            let like = LikeInfo {
                channel_id,
                post_id,
                comment_id,
                user: user.clone(),
                total_count,
            };
            self.hub.notify_channel(channel_id, || Notification::NewLike(like.clone()));
        }
        Ok(Reply::empty())
    }

    pub fn post_unlike(&mut self, user: &UserInfo, channel_id: u64, post_id: u64, comment_id: u64) -> Result<Reply> {
        self.require_likeable(channel_id, post_id, comment_id)?;

        self.db
            .remove_like(user.uid, channel_id, post_id, comment_id)?
            .ok_or_else(|| FeedsError::wrong_state(format!("user {} has not liked it", user.uid)))?;
        Ok(Reply::empty())
    }

    fn require_likeable(&self, channel_id: u64, post_id: u64, comment_id: u64) -> Result<()> {
        self.available_post(channel_id, post_id)?;
        if comment_id != 0 {
            self.live_comment(channel_id, post_id, comment_id)?;
        }
        Ok(())
    }
}
