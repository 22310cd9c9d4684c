use tracing::info;

use feeds_core::{FeedsError, Result, Transport, now_secs};
use feeds_types::api::Reply;
use feeds_types::events::Notification;
use feeds_types::{PostInfo, PostStatus, UserInfo};

use crate::FeedsService;

impl<T: Transport> FeedsService<T> {
    pub fn publish_post(&mut self, user: &UserInfo, channel_id: u64, content: Vec<u8>) -> Result<Reply> {
        self.require_owner(user)?;

        let now = now_secs();
        let db = self.db.clone();
        let post = self
            .hub
            .publish_post(channel_id, now, |post_id| db.insert_post(channel_id, post_id, &content, now))?;
        info!("Post {} published in channel {}", post.post_id, channel_id);

        let id = post.post_id;
        self.hub.notify_channel(channel_id, || Notification::NewPost(post.clone()));
        Ok(Reply::Id { id })
    }

    pub fn edit_post(&mut self, user: &UserInfo, channel_id: u64, post_id: u64, content: Vec<u8>) -> Result<Reply> {
        self.require_owner(user)?;
        self.require_channel(channel_id)?;

        let now = now_secs();
        let post = self
            .db
            .update_post_content(channel_id, post_id, &content, now)?
            .ok_or_else(|| FeedsError::not_exist(format!("post {channel_id}/{post_id}")))?;

        self.post_changed(post, now);
        Ok(Reply::empty())
    }

    /// Deleted posts keep their id and row; only status and content change.
    pub fn delete_post(&mut self, user: &UserInfo, channel_id: u64, post_id: u64) -> Result<Reply> {
        self.require_owner(user)?;
        self.require_channel(channel_id)?;

        let now = now_secs();
        let post = self
            .db
            .delete_post(channel_id, post_id, now)?
            .ok_or_else(|| FeedsError::not_exist(format!("post {channel_id}/{post_id}")))?;

        self.post_changed(post, now);
        Ok(Reply::empty())
    }

    fn post_changed(&mut self, post: PostInfo, now: u64) {
        let channel_id = post.channel_id;
        self.hub.touch_channel(channel_id, now);
        self.hub.notify_channel(channel_id, || Notification::PostUpdated(post.clone()));
    }

    /// The post, if it exists and has not been deleted.
    pub(crate) fn available_post(&self, channel_id: u64, post_id: u64) -> Result<PostInfo> {
        self.require_channel(channel_id)?;
        match self.db.get_post(channel_id, post_id)? {
            Some(post) if post.status == PostStatus::Available => Ok(post),
            _ => Err(FeedsError::not_exist(format!("post {channel_id}/{post_id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use feeds_types::PostStatus;
    use feeds_types::events::{Call, Notification};

    use crate::testing::Harness;

    #[test]
    fn post_ids_follow_channel_counter() {
        let mut h = Harness::new();
        let chan = h.create_channel("tech");

        assert_eq!(h.publish(chan, b"one"), 1);
        assert_eq!(h.publish(chan, b"two"), 2);

        let detail = h.owner_ok("N0", Call::GetChannelDetail { id: chan });
        assert_eq!(detail["next_post_id"], 3);

        let missing = h.owner_call("N0", Call::PublishPost {
            channel_id: 42,
            content: b"x".to_vec(),
        });
        assert_eq!(Harness::error_code(&missing), Some("NOT_EXIST"));
    }

    #[test]
    fn edit_and_delete_notify_post_updated() {
        let mut h = Harness::new();
        let chan = h.create_channel("tech");
        let alice = h.token("alice");
        h.ok("N1", &alice, Call::SubscribeChannel { id: chan });
        h.ok("N1", &alice, Call::EnableNotification);
        let post_id = h.publish(chan, b"draft");

        h.owner_ok("N0", Call::EditPost {
            channel_id: chan,
            post_id,
            content: b"final".to_vec(),
        });
        h.owner_ok("N0", Call::DeletePost { channel_id: chan, post_id });

        let updates: Vec<_> = h
            .notifications("N1")
            .into_iter()
            .filter_map(|n| match n {
                Notification::PostUpdated(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].content, b"final");
        assert_eq!(updates[1].status, PostStatus::Deleted);

        let again = h.owner_call("N0", Call::EditPost {
            channel_id: chan,
            post_id,
            content: b"zombie".to_vec(),
        });
        assert_eq!(Harness::error_code(&again), Some("NOT_EXIST"));
    }

    #[test]
    fn non_owner_cannot_publish() {
        let mut h = Harness::new();
        let chan = h.create_channel("tech");
        let alice = h.token("alice");
        let resp = h.call("N1", &alice, Call::PublishPost {
            channel_id: chan,
            content: b"spam".to_vec(),
        });
        assert_eq!(Harness::error_code(&resp), Some("NOT_AUTHORIZED"));
    }
}
