use serde::{Deserialize, Serialize};

use crate::api::{ErrorBody, Reply};
use crate::models::{
    ChannelInfo, CommentInfo, LikeInfo, PostInfo, QueryCriteria, ReportedComment, UserInfo,
};

/// Push notifications delivered to peer nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Notification {
    ChannelUpdated(ChannelInfo),
    NewPost(PostInfo),
    PostUpdated(PostInfo),
    NewComment(CommentInfo),
    CommentUpdated(CommentInfo),
    NewLike(LikeInfo),
    /// Owner only.
    NewSubscription { channel_id: u64, user: UserInfo },
    /// Broadcast to every destination.
    StatisticsChanged { total_clients: u64 },
    /// Owner only.
    ReportIllegalComment(ReportedComment),
}

impl Notification {
    pub fn method(&self) -> &'static str {
        match self {
            Self::ChannelUpdated(_) => "channel_updated",
            Self::NewPost(_) => "new_post",
            Self::PostUpdated(_) => "post_updated",
            Self::NewComment(_) => "new_comment",
            Self::CommentUpdated(_) => "comment_updated",
            Self::NewLike(_) => "new_like",
            Self::NewSubscription { .. } => "new_subscription",
            Self::StatisticsChanged { .. } => "statistics_changed",
            Self::ReportIllegalComment(_) => "report_illegal_comment",
        }
    }

    /// Returns the channel id if this notification is scoped to a channel.
    pub fn channel_id(&self) -> Option<u64> {
        match self {
            Self::ChannelUpdated(c) => Some(c.id),
            Self::NewPost(p) | Self::PostUpdated(p) => Some(p.channel_id),
            Self::NewComment(c) | Self::CommentUpdated(c) => Some(c.channel_id),
            Self::NewLike(l) => Some(l.channel_id),
            Self::NewSubscription { channel_id, .. } => Some(*channel_id),
            Self::ReportIllegalComment(r) => Some(r.channel_id),
            Self::StatisticsChanged { .. } => None,
        }
    }
}

/// A request sent FROM a peer TO the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(default)]
    pub access_token: String,
    #[serde(flatten)]
    pub call: Call,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Call {
    CreateChannel {
        name: String,
        intro: String,
        #[serde(default, with = "crate::api::base64_bytes")]
        avatar: Vec<u8>,
    },
    UpdateChannel {
        id: u64,
        name: String,
        intro: String,
        #[serde(default, with = "crate::api::base64_bytes")]
        avatar: Vec<u8>,
    },
    PublishPost {
        channel_id: u64,
        #[serde(with = "crate::api::base64_bytes")]
        content: Vec<u8>,
    },
    EditPost {
        channel_id: u64,
        post_id: u64,
        #[serde(with = "crate::api::base64_bytes")]
        content: Vec<u8>,
    },
    DeletePost {
        channel_id: u64,
        post_id: u64,
    },
    PostComment {
        channel_id: u64,
        post_id: u64,
        #[serde(default)]
        comment_id: u64,
        #[serde(with = "crate::api::base64_bytes")]
        content: Vec<u8>,
    },
    EditComment {
        channel_id: u64,
        post_id: u64,
        id: u64,
        #[serde(with = "crate::api::base64_bytes")]
        content: Vec<u8>,
    },
    DeleteComment {
        channel_id: u64,
        post_id: u64,
        id: u64,
    },
    BlockComment {
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
    },
    UnblockComment {
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
    },
    PostLike {
        channel_id: u64,
        post_id: u64,
        #[serde(default)]
        comment_id: u64,
    },
    PostUnlike {
        channel_id: u64,
        post_id: u64,
        #[serde(default)]
        comment_id: u64,
    },
    ReportIllegalComment {
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
        reasons: String,
    },
    GetChannels {
        #[serde(flatten)]
        criteria: QueryCriteria,
    },
    GetChannelDetail {
        id: u64,
    },
    GetSubscribedChannels {
        #[serde(flatten)]
        criteria: QueryCriteria,
    },
    GetPosts {
        channel_id: u64,
        #[serde(flatten)]
        criteria: QueryCriteria,
    },
    GetComments {
        channel_id: u64,
        post_id: u64,
        #[serde(flatten)]
        criteria: QueryCriteria,
    },
    GetLikedPosts {
        #[serde(flatten)]
        criteria: QueryCriteria,
    },
    GetStatistics,
    SubscribeChannel {
        id: u64,
    },
    UnsubscribeChannel {
        id: u64,
    },
    EnableNotification,
}

impl Call {
    pub fn method(&self) -> &'static str {
        match self {
            Self::CreateChannel { .. } => "create_channel",
            Self::UpdateChannel { .. } => "update_channel",
            Self::PublishPost { .. } => "publish_post",
            Self::EditPost { .. } => "edit_post",
            Self::DeletePost { .. } => "delete_post",
            Self::PostComment { .. } => "post_comment",
            Self::EditComment { .. } => "edit_comment",
            Self::DeleteComment { .. } => "delete_comment",
            Self::BlockComment { .. } => "block_comment",
            Self::UnblockComment { .. } => "unblock_comment",
            Self::PostLike { .. } => "post_like",
            Self::PostUnlike { .. } => "post_unlike",
            Self::ReportIllegalComment { .. } => "report_illegal_comment",
            Self::GetChannels { .. } => "get_channels",
            Self::GetChannelDetail { .. } => "get_channel_detail",
            Self::GetSubscribedChannels { .. } => "get_subscribed_channels",
            Self::GetPosts { .. } => "get_posts",
            Self::GetComments { .. } => "get_comments",
            Self::GetLikedPosts { .. } => "get_liked_posts",
            Self::GetStatistics => "get_statistics",
            Self::SubscribeChannel { .. } => "subscribe_channel",
            Self::UnsubscribeChannel { .. } => "unsubscribe_channel",
            Self::EnableNotification => "enable_notification",
        }
    }
}

/// Reply to a [`Request`], matched by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn ok(id: u64, reply: &Reply) -> Self {
        let result = serde_json::to_value(reply).unwrap_or(serde_json::Value::Null);
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: u64, code: &str, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }
}

/// Everything the service pushes down a peer connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outbound {
    Response(Response),
    Notification(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_decodes_flattened_criteria() {
        let raw = r#"{"id":7,"access_token":"tk","method":"get_posts","params":{"channel_id":3,"by":"id","max_count":10}}"#;
        let req: Request = serde_json::from_str(raw).unwrap();
        assert_eq!(req.id, 7);
        match req.call {
            Call::GetPosts { channel_id, criteria } => {
                assert_eq!(channel_id, 3);
                assert_eq!(criteria.by, crate::QueryField::Id);
                assert_eq!(criteria.max_count, 10);
                assert_eq!(criteria.upper, 0);
            }
            other => panic!("unexpected call {}", other.method()),
        }
    }

    #[test]
    fn unit_method_decodes_without_params() {
        let raw = r#"{"id":1,"access_token":"tk","method":"enable_notification"}"#;
        let req: Request = serde_json::from_str(raw).unwrap();
        assert_eq!(req.call.method(), "enable_notification");
    }

    #[test]
    fn notification_uses_method_and_params() {
        let n = Notification::StatisticsChanged { total_clients: 4 };
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["method"], "statistics_changed");
        assert_eq!(v["params"]["total_clients"], 4);
        assert_eq!(n.channel_id(), None);
    }

    #[test]
    fn error_response_omits_result() {
        let resp = Response::err(9, "NOT_EXIST", "channel 4 does not exist");
        let v = serde_json::to_value(&resp).unwrap();
        assert!(v.get("result").is_none());
        assert_eq!(v["error"]["code"], "NOT_EXIST");
    }
}
