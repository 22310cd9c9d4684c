//! Column lists and row mappers from SQLite rows to the shared feeds types.
//! Integers are stored as SQLite INTEGER (i64) and surfaced as u64.

use feeds_types::{ChannelInfo, CommentInfo, CommentStatus, PostInfo, PostStatus, UserInfo};
use rusqlite::Row;

pub const USER_COLUMNS: &str = "user_id, did, name, email";

pub const CHANNEL_COLUMNS: &str =
    "channel_id, name, intro, owner_id, created_at, updated_at, subscribers, next_post_id, avatar";

pub const POST_COLUMNS: &str =
    "p.channel_id, p.post_id, p.status, p.content, p.comments, p.likes, p.created_at, p.updated_at";

/// Comment columns followed by the author's user columns; expects `comments c JOIN users u`.
pub const COMMENT_COLUMNS: &str = "c.channel_id, c.post_id, c.comment_id, c.refcomment_id, \
     c.status, c.content, c.likes, c.created_at, c.updated_at, u.user_id, u.did, u.name, u.email";

pub fn to_sql_int(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

pub fn get_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let v: i64 = row.get(idx)?;
    u64::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, v))
}

pub fn user_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<UserInfo> {
    Ok(UserInfo {
        uid: get_u64(row, offset)?,
        did: row.get(offset + 1)?,
        name: row.get(offset + 2)?,
        email: row.get(offset + 3)?,
    })
}

pub fn channel_from_row(row: &Row<'_>) -> rusqlite::Result<ChannelInfo> {
    Ok(ChannelInfo {
        id: get_u64(row, 0)?,
        name: row.get(1)?,
        intro: row.get(2)?,
        owner_uid: get_u64(row, 3)?,
        created_at: get_u64(row, 4)?,
        updated_at: get_u64(row, 5)?,
        subscriber_count: get_u64(row, 6)?,
        next_post_id: get_u64(row, 7)?,
        avatar: row.get(8)?,
    })
}

pub fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostInfo> {
    let status: i64 = row.get(2)?;
    Ok(PostInfo {
        channel_id: get_u64(row, 0)?,
        post_id: get_u64(row, 1)?,
        status: PostStatus::from_i64(status)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, status))?,
        content: row.get(3)?,
        comment_count: get_u64(row, 4)?,
        likes: get_u64(row, 5)?,
        created_at: get_u64(row, 6)?,
        updated_at: get_u64(row, 7)?,
    })
}

pub fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentInfo> {
    let status: i64 = row.get(4)?;
    Ok(CommentInfo {
        channel_id: get_u64(row, 0)?,
        post_id: get_u64(row, 1)?,
        comment_id: get_u64(row, 2)?,
        reply_to: get_u64(row, 3)?,
        status: CommentStatus::from_i64(status)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, status))?,
        content: row.get(5)?,
        likes: get_u64(row, 6)?,
        created_at: get_u64(row, 7)?,
        updated_at: get_u64(row, 8)?,
        user: user_from_row(row, 9)?,
    })
}
