pub mod api;
pub mod events;
pub mod models;

pub use models::{
    ChannelInfo, CommentInfo, CommentStatus, LikeInfo, PostInfo, PostStatus, QueryCriteria,
    QueryField, ReportedComment, Statistics, UserInfo,
};
