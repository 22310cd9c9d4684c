use serde::{Deserialize, Serialize};

use crate::models::{ChannelInfo, CommentInfo, PostInfo, Statistics};

// -- JWT Claims --

/// Access-token claims shared by the issuer (tooling, tests) and the request handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user's DID.
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub exp: usize,
}

// -- Replies --

/// Successful result payload of a request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Empty {},
    Id { id: u64 },
    Channel(ChannelInfo),
    Channels { channels: Vec<ChannelInfo> },
    Posts { posts: Vec<PostInfo> },
    Comments { comments: Vec<CommentInfo> },
    Statistics(Statistics),
}

impl Reply {
    pub fn empty() -> Self {
        Self::Empty {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Binary fields travel as standard base64 strings.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&B64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        B64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
