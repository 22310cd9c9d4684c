use feeds_core::{FeedsError, Result, Transport, now_secs};
use feeds_types::api::Reply;
use feeds_types::events::Notification;
use feeds_types::{CommentInfo, CommentStatus, ReportedComment, UserInfo};

use crate::FeedsService;

impl<T: Transport> FeedsService<T> {
    /// Comment on a post, or reply to comment `reply_to` when it is non-zero.
    pub fn post_comment(
        &mut self,
        user: &UserInfo,
        channel_id: u64,
        post_id: u64,
        reply_to: u64,
        content: Vec<u8>,
    ) -> Result<Reply> {
        self.available_post(channel_id, post_id)?;
        if reply_to != 0 {
            self.live_comment(channel_id, post_id, reply_to)?;
        }

        let now = now_secs();
        let comment = self
            .db
            .insert_comment(channel_id, post_id, reply_to, user.uid, &content, now)?;
        self.hub.touch_channel(channel_id, now);

        let id = comment.comment_id;
        self.hub.notify_channel(channel_id, || Notification::NewComment(comment.clone()));
        Ok(Reply::Id { id })
    }

    pub fn edit_comment(
        &mut self,
        user: &UserInfo,
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
        content: Vec<u8>,
    ) -> Result<Reply> {
        let comment = self.live_comment(channel_id, post_id, comment_id)?;
        if comment.user.uid != user.uid {
            return Err(FeedsError::not_authorized(format!(
                "comment {comment_id} belongs to user {}",
                comment.user.uid
            )));
        }
        if comment.status == CommentStatus::Blocked {
            return Err(FeedsError::wrong_state(format!("comment {comment_id} is blocked")));
        }

        let updated = self
            .db
            .update_comment_content(channel_id, post_id, comment_id, &content, now_secs())?
            .ok_or_else(|| FeedsError::not_exist(format!("comment {comment_id}")))?;

        self.comment_changed(updated);
        Ok(Reply::empty())
    }

    /// Authors delete their own comments; the owner may delete any.
    pub fn delete_comment(&mut self, user: &UserInfo, channel_id: u64, post_id: u64, comment_id: u64) -> Result<Reply> {
        let comment = self.live_comment(channel_id, post_id, comment_id)?;
        if comment.user.uid != user.uid && !user.is_owner() {
            return Err(FeedsError::not_authorized(format!(
                "user {} may not delete comment {comment_id}",
                user.uid
            )));
        }

        self.set_comment_status(channel_id, post_id, comment_id, CommentStatus::Deleted)?;
        Ok(Reply::empty())
    }

    /// Owner moderation: `block` moves an available comment to blocked, otherwise a blocked
    /// comment back to available.
    pub fn block_comment(
        &mut self,
        user: &UserInfo,
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
        block: bool,
    ) -> Result<Reply> {
        self.require_owner(user)?;
        let comment = self.live_comment(channel_id, post_id, comment_id)?;

        let (from, to) = if block {
            (CommentStatus::Available, CommentStatus::Blocked)
        } else {
            (CommentStatus::Blocked, CommentStatus::Available)
        };
        if comment.status != from {
            return Err(FeedsError::wrong_state(format!(
                "comment {comment_id} is {:?}",
                comment.status
            )));
        }

        self.set_comment_status(channel_id, post_id, comment_id, to)?;
        Ok(Reply::empty())
    }

    /// Report a comment to the owner.
    pub fn report_illegal_comment(
        &mut self,
        user: &UserInfo,
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
        reasons: String,
    ) -> Result<Reply> {
        self.live_comment(channel_id, post_id, comment_id)?;

        let report = ReportedComment {
            channel_id,
            post_id,
            comment_id,
            reporter: user.clone(),
            reasons,
            created_at: now_secs(),
        };
        self.db.insert_report(&report)?;

        self.hub.notify_owner(|| Notification::ReportIllegalComment(report.clone()));
        Ok(Reply::empty())
    }

    fn set_comment_status(&mut self, channel_id: u64, post_id: u64, comment_id: u64, status: CommentStatus) -> Result<()> {
        let updated = self
            .db
            .set_comment_status(channel_id, post_id, comment_id, status, now_secs())?
            .ok_or_else(|| FeedsError::not_exist(format!("comment {comment_id}")))?;
        self.comment_changed(updated);
        Ok(())
    }

    fn comment_changed(&self, comment: CommentInfo) {
        let channel_id = comment.channel_id;
        self.hub
            .notify_channel(channel_id, || Notification::CommentUpdated(comment.clone()));
    }

    /// The comment, if its channel exists and it has not been deleted.
    pub(crate) fn live_comment(&self, channel_id: u64, post_id: u64, comment_id: u64) -> Result<CommentInfo> {
        self.require_channel(channel_id)?;
        match self.db.get_comment(channel_id, post_id, comment_id)? {
            Some(comment) if comment.status != CommentStatus::Deleted => Ok(comment),
            _ => Err(FeedsError::not_exist(format!(
                "comment {channel_id}/{post_id}/{comment_id}"
            ))),
        }
    }
}
