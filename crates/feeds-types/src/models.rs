use serde::{Deserialize, Serialize};

/// The service owner is always the first user row.
pub const OWNER_USER_ID: u64 = 1;

pub const CHANNEL_ID_START: u64 = 1;
pub const POST_ID_START: u64 = 1;
pub const COMMENT_ID_START: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub uid: u64,
    pub did: String,
    pub name: String,
    pub email: String,
}

impl UserInfo {
    pub fn is_owner(&self) -> bool {
        self.uid == OWNER_USER_ID
    }
}

/// Canonical channel record as held by the channel registry and the channels table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
    pub intro: String,
    pub owner_uid: u64,
    pub created_at: u64,
    pub updated_at: u64,
    pub subscriber_count: u64,
    pub next_post_id: u64,
    #[serde(with = "crate::api::base64_bytes")]
    pub avatar: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Available,
    Deleted,
}

impl PostStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Available => 0,
            Self::Deleted => 1,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Available),
            1 => Some(Self::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInfo {
    pub channel_id: u64,
    pub post_id: u64,
    pub status: PostStatus,
    #[serde(with = "crate::api::base64_bytes")]
    pub content: Vec<u8>,
    pub comment_count: u64,
    pub likes: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Available,
    Deleted,
    Blocked,
}

impl CommentStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Available => 0,
            Self::Deleted => 1,
            Self::Blocked => 2,
        }
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::Available),
            1 => Some(Self::Deleted),
            2 => Some(Self::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInfo {
    pub channel_id: u64,
    pub post_id: u64,
    pub comment_id: u64,
    /// 0 for a top-level comment.
    pub reply_to: u64,
    pub status: CommentStatus,
    pub user: UserInfo,
    #[serde(with = "crate::api::base64_bytes")]
    pub content: Vec<u8>,
    pub likes: u64,
    pub created_at: u64,
    pub updated_at: u64,
}

/// A like on a post (`comment_id == 0`) or on a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeInfo {
    pub channel_id: u64,
    pub post_id: u64,
    pub comment_id: u64,
    pub user: UserInfo,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedComment {
    pub channel_id: u64,
    pub post_id: u64,
    pub comment_id: u64,
    pub reporter: UserInfo,
    pub reasons: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub did: String,
    pub connecting_clients: u64,
    pub total_clients: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryField {
    #[default]
    None,
    Id,
    UpdatedAt,
    CreatedAt,
}

/// Range filter shared by the list queries. Zero bounds and a zero `max_count` mean unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCriteria {
    pub by: QueryField,
    pub upper: u64,
    pub lower: u64,
    pub max_count: u64,
}
