use crate::Database;
use crate::models::{
    CHANNEL_COLUMNS, COMMENT_COLUMNS, POST_COLUMNS, USER_COLUMNS, channel_from_row,
    comment_from_row, get_u64, post_from_row, to_sql_int, user_from_row,
};
use anyhow::{Result, bail};
use feeds_core::now_secs;
use feeds_types::models::{COMMENT_ID_START, OWNER_USER_ID};
use feeds_types::{
    ChannelInfo, CommentInfo, CommentStatus, PostInfo, PostStatus, QueryCriteria, QueryField,
    ReportedComment, UserInfo,
};
use rusqlite::{Connection, params, params_from_iter};
use tracing::info;

impl Database {
    // -- Users --

    /// Seed the owner as user 1, or check that an existing database belongs to `did`.
    pub fn ensure_owner(&self, did: &str, name: &str) -> Result<UserInfo> {
        self.with_conn(|conn| {
            if let Some(owner) = query_user_by_id(conn, OWNER_USER_ID)? {
                if owner.did != did {
                    bail!("Database belongs to owner {}, not {}", owner.did, did);
                }
                return Ok(owner);
            }

            conn.execute(
                "INSERT INTO users (user_id, did, name) VALUES (?1, ?2, ?3)",
                params![to_sql_int(OWNER_USER_ID), did, name],
            )?;
            info!("Owner {} seeded as user {}", did, OWNER_USER_ID);

            Ok(UserInfo {
                uid: OWNER_USER_ID,
                did: did.to_string(),
                name: name.to_string(),
                email: String::new(),
            })
        })
    }

    /// Look a user up by DID, creating the row on first sight. The flag is true when the
    /// user was created by this call.
    pub fn get_or_create_user(&self, did: &str, name: &str, email: &str) -> Result<(UserInfo, bool)> {
        self.with_conn(|conn| {
            if let Some(mut user) = query_user_by_did(conn, did)? {
                if user.name != name || user.email != email {
                    conn.execute(
                        "UPDATE users SET name = ?2, email = ?3 WHERE user_id = ?1",
                        params![to_sql_int(user.uid), name, email],
                    )?;
                    user.name = name.to_string();
                    user.email = email.to_string();
                }
                return Ok((user, false));
            }

            conn.execute(
                "INSERT INTO users (did, name, email) VALUES (?1, ?2, ?3)",
                params![did, name, email],
            )?;
            let uid = u64::try_from(conn.last_insert_rowid())?;
            info!("New user {} registered as {}", did, uid);

            Ok((
                UserInfo {
                    uid,
                    did: did.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                },
                true,
            ))
        })
    }

    pub fn get_user(&self, uid: u64) -> Result<Option<UserInfo>> {
        self.with_conn(|conn| query_user_by_id(conn, uid))
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(u64::try_from(n)?)
        })
    }

    // -- Channels --

    pub fn insert_channel(&self, info: &ChannelInfo) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (channel_id, name, intro, owner_id, created_at, updated_at, subscribers, next_post_id, avatar)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    to_sql_int(info.id),
                    info.name,
                    info.intro,
                    to_sql_int(info.owner_uid),
                    to_sql_int(info.created_at),
                    to_sql_int(info.updated_at),
                    to_sql_int(info.subscriber_count),
                    to_sql_int(info.next_post_id),
                    info.avatar,
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_channel(&self, info: &ChannelInfo) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE channels SET name = ?2, intro = ?3, updated_at = ?4, avatar = ?5 WHERE channel_id = ?1",
                params![
                    to_sql_int(info.id),
                    info.name,
                    info.intro,
                    to_sql_int(info.updated_at),
                    info.avatar,
                ],
            )?;
            if changed == 0 {
                bail!("Channel {} not found", info.id);
            }
            Ok(())
        })
    }

    pub fn load_channels(&self) -> Result<Vec<ChannelInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY channel_id"
            ))?;
            let rows = stmt
                .query_map([], channel_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_channels(&self, criteria: &QueryCriteria) -> Result<Vec<ChannelInfo>> {
        let (clause, params) = listing(criteria, "", "channel_id");
        let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE 1 = 1{clause}");
        self.with_conn(|conn| query_list(conn, &sql, params, channel_from_row))
    }

    pub fn get_subscribed_channels(&self, uid: u64, criteria: &QueryCriteria) -> Result<Vec<ChannelInfo>> {
        let (clause, mut params) = listing(criteria, "", "channel_id");
        params.insert(0, to_sql_int(uid));
        let sql = format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels
             WHERE channel_id IN (SELECT channel_id FROM subscriptions WHERE user_id = ?){clause}"
        );
        self.with_conn(|conn| query_list(conn, &sql, params, channel_from_row))
    }

    // -- Subscriptions --

    /// Record the subscription and bump the channel's subscriber count in one transaction.
    pub fn subscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO subscriptions (user_id, channel_id, created_at) VALUES (?1, ?2, ?3)",
                params![to_sql_int(uid), to_sql_int(channel_id), to_sql_int(now_secs())],
            )?;
            tx.execute(
                "UPDATE channels SET subscribers = subscribers + 1 WHERE channel_id = ?1",
                [to_sql_int(channel_id)],
            )?;
            Ok(())
        })
    }

    pub fn unsubscribe(&self, uid: u64, channel_id: u64) -> Result<()> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM subscriptions WHERE user_id = ?1 AND channel_id = ?2",
                [to_sql_int(uid), to_sql_int(channel_id)],
            )?;
            if removed == 0 {
                bail!("User {} is not subscribed to channel {}", uid, channel_id);
            }
            tx.execute(
                "UPDATE channels SET subscribers = MAX(subscribers - 1, 0) WHERE channel_id = ?1",
                [to_sql_int(channel_id)],
            )?;
            Ok(())
        })
    }

    pub fn is_subscribed(&self, uid: u64, channel_id: u64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM subscriptions WHERE user_id = ?1 AND channel_id = ?2",
                    [to_sql_int(uid), to_sql_int(channel_id)],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn subscriptions_of(&self, uid: u64) -> Result<Vec<u64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT channel_id FROM subscriptions WHERE user_id = ?1 ORDER BY channel_id",
            )?;
            let ids = stmt
                .query_map([to_sql_int(uid)], |row| get_u64(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    // -- Posts --

    /// Insert post `post_id` and advance the channel's post counter past it.
    pub fn insert_post(&self, channel_id: u64, post_id: u64, content: &[u8], now: u64) -> Result<PostInfo> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO posts (channel_id, post_id, status, content, next_comment_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    PostStatus::Available.as_i64(),
                    content,
                    to_sql_int(COMMENT_ID_START),
                    to_sql_int(now),
                ],
            )?;
            tx.execute(
                "UPDATE channels SET next_post_id = ?2, updated_at = ?3 WHERE channel_id = ?1",
                [to_sql_int(channel_id), to_sql_int(post_id + 1), to_sql_int(now)],
            )?;
            Ok(PostInfo {
                channel_id,
                post_id,
                status: PostStatus::Available,
                content: content.to_vec(),
                comment_count: 0,
                likes: 0,
                created_at: now,
                updated_at: now,
            })
        })
    }

    pub fn get_post(&self, channel_id: u64, post_id: u64) -> Result<Option<PostInfo>> {
        self.with_conn(|conn| query_post(conn, channel_id, post_id))
    }

    /// Replace an available post's content. None if there is no such available post.
    pub fn update_post_content(
        &self,
        channel_id: u64,
        post_id: u64,
        content: &[u8],
        now: u64,
    ) -> Result<Option<PostInfo>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE posts SET content = ?3, updated_at = ?4
                 WHERE channel_id = ?1 AND post_id = ?2 AND status = ?5",
                params![
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    content,
                    to_sql_int(now),
                    PostStatus::Available.as_i64(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            touch_channel(tx, channel_id, now)?;
            query_post(tx, channel_id, post_id)
        })
    }

    /// Mark an available post deleted and drop its content.
    pub fn delete_post(&self, channel_id: u64, post_id: u64, now: u64) -> Result<Option<PostInfo>> {
        self.with_tx(|tx| {
            let changed = tx.execute(
                "UPDATE posts SET status = ?3, content = X'', updated_at = ?4
                 WHERE channel_id = ?1 AND post_id = ?2 AND status = ?5",
                params![
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    PostStatus::Deleted.as_i64(),
                    to_sql_int(now),
                    PostStatus::Available.as_i64(),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            touch_channel(tx, channel_id, now)?;
            query_post(tx, channel_id, post_id)
        })
    }

    pub fn get_posts(&self, channel_id: u64, criteria: &QueryCriteria) -> Result<Vec<PostInfo>> {
        let (clause, mut params) = listing(criteria, "p.", "post_id");
        params.insert(0, to_sql_int(channel_id));
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.channel_id = ?{clause}");
        self.with_conn(|conn| query_list(conn, &sql, params, post_from_row))
    }

    /// Posts (not comments) the user currently likes.
    pub fn get_liked_posts(&self, uid: u64, criteria: &QueryCriteria) -> Result<Vec<PostInfo>> {
        let (clause, mut params) = listing(criteria, "p.", "post_id");
        params.insert(0, to_sql_int(uid));
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p
             JOIN likes l ON l.channel_id = p.channel_id AND l.post_id = p.post_id AND l.comment_id = 0
             WHERE l.user_id = ?{clause}"
        );
        self.with_conn(|conn| query_list(conn, &sql, params, post_from_row))
    }

    // -- Comments --

    /// Insert a comment under the post's next comment id and bump the post's counters.
    pub fn insert_comment(
        &self,
        channel_id: u64,
        post_id: u64,
        reply_to: u64,
        uid: u64,
        content: &[u8],
        now: u64,
    ) -> Result<CommentInfo> {
        self.with_tx(|tx| {
            let next: i64 = tx.query_row(
                "SELECT next_comment_id FROM posts WHERE channel_id = ?1 AND post_id = ?2",
                [to_sql_int(channel_id), to_sql_int(post_id)],
                |row| row.get(0),
            )?;
            let comment_id = u64::try_from(next)?;

            tx.execute(
                "INSERT INTO comments (channel_id, post_id, comment_id, refcomment_id, status, user_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    next,
                    to_sql_int(reply_to),
                    CommentStatus::Available.as_i64(),
                    to_sql_int(uid),
                    content,
                    to_sql_int(now),
                ],
            )?;
            tx.execute(
                "UPDATE posts SET next_comment_id = ?3, comments = comments + 1
                 WHERE channel_id = ?1 AND post_id = ?2",
                [to_sql_int(channel_id), to_sql_int(post_id), next + 1],
            )?;
            touch_channel(tx, channel_id, now)?;

            match query_comment(tx, channel_id, post_id, comment_id)? {
                Some(comment) => Ok(comment),
                None => bail!("Comment {} vanished after insert", comment_id),
            }
        })
    }

    pub fn get_comment(&self, channel_id: u64, post_id: u64, comment_id: u64) -> Result<Option<CommentInfo>> {
        self.with_conn(|conn| query_comment(conn, channel_id, post_id, comment_id))
    }

    pub fn update_comment_content(
        &self,
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
        content: &[u8],
        now: u64,
    ) -> Result<Option<CommentInfo>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?4, updated_at = ?5
                 WHERE channel_id = ?1 AND post_id = ?2 AND comment_id = ?3",
                params![
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    to_sql_int(comment_id),
                    content,
                    to_sql_int(now),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_comment(conn, channel_id, post_id, comment_id)
        })
    }

    /// Move a comment to `status`. Deleting also drops its content.
    pub fn set_comment_status(
        &self,
        channel_id: u64,
        post_id: u64,
        comment_id: u64,
        status: CommentStatus,
        now: u64,
    ) -> Result<Option<CommentInfo>> {
        let sql = if status == CommentStatus::Deleted {
            "UPDATE comments SET status = ?4, content = X'', updated_at = ?5
             WHERE channel_id = ?1 AND post_id = ?2 AND comment_id = ?3"
        } else {
            "UPDATE comments SET status = ?4, updated_at = ?5
             WHERE channel_id = ?1 AND post_id = ?2 AND comment_id = ?3"
        };
        self.with_conn(|conn| {
            let changed = conn.execute(
                sql,
                [
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    to_sql_int(comment_id),
                    status.as_i64(),
                    to_sql_int(now),
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_comment(conn, channel_id, post_id, comment_id)
        })
    }

    pub fn get_comments(&self, channel_id: u64, post_id: u64, criteria: &QueryCriteria) -> Result<Vec<CommentInfo>> {
        let (clause, mut params) = listing(criteria, "c.", "comment_id");
        params.splice(0..0, [to_sql_int(channel_id), to_sql_int(post_id)]);
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.user_id = c.user_id
             WHERE c.channel_id = ? AND c.post_id = ?{clause}"
        );
        self.with_conn(|conn| query_list(conn, &sql, params, comment_from_row))
    }

    // -- Likes --

    /// Like a post (`comment_id == 0`) or a comment. Returns the new like total, or None
    /// if the user already liked it.
    pub fn add_like(&self, uid: u64, channel_id: u64, post_id: u64, comment_id: u64, now: u64) -> Result<Option<u64>> {
        self.with_tx(|tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO likes (user_id, channel_id, post_id, comment_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                [
                    to_sql_int(uid),
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    to_sql_int(comment_id),
                    to_sql_int(now),
                ],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            adjust_likes(tx, channel_id, post_id, comment_id, "likes + 1").map(Some)
        })
    }

    /// Returns the new like total, or None if the user had not liked it.
    pub fn remove_like(&self, uid: u64, channel_id: u64, post_id: u64, comment_id: u64) -> Result<Option<u64>> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND channel_id = ?2 AND post_id = ?3 AND comment_id = ?4",
                [
                    to_sql_int(uid),
                    to_sql_int(channel_id),
                    to_sql_int(post_id),
                    to_sql_int(comment_id),
                ],
            )?;
            if removed == 0 {
                return Ok(None);
            }
            adjust_likes(tx, channel_id, post_id, comment_id, "MAX(likes - 1, 0)").map(Some)
        })
    }

    // -- Reports --

    pub fn insert_report(&self, report: &ReportedComment) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO reported_comments (channel_id, post_id, comment_id, reporter_id, reasons, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    to_sql_int(report.channel_id),
                    to_sql_int(report.post_id),
                    to_sql_int(report.comment_id),
                    to_sql_int(report.reporter.uid),
                    report.reasons,
                    to_sql_int(report.created_at),
                ],
            )?;
            Ok(())
        })
    }
}

/// Build the filter/order/limit tail of a list query. `prefix` qualifies column names in
/// joined queries; `id_col` is the column ordered on when no field is chosen.
fn listing(criteria: &QueryCriteria, prefix: &str, id_col: &str) -> (String, Vec<i64>) {
    let column = match criteria.by {
        QueryField::None | QueryField::Id => id_col,
        QueryField::UpdatedAt => "updated_at",
        QueryField::CreatedAt => "created_at",
    };
    let column = format!("{prefix}{column}");

    let mut clause = String::new();
    let mut params = Vec::new();
    if criteria.by != QueryField::None {
        if criteria.upper > 0 {
            clause.push_str(&format!(" AND {column} <= ?"));
            params.push(to_sql_int(criteria.upper));
        }
        if criteria.lower > 0 {
            clause.push_str(&format!(" AND {column} >= ?"));
            params.push(to_sql_int(criteria.lower));
        }
    }

    clause.push_str(&format!(" ORDER BY {column} DESC LIMIT ?"));
    // SQLite treats a negative limit as unbounded
    params.push(if criteria.max_count == 0 {
        -1
    } else {
        to_sql_int(criteria.max_count)
    });

    (clause, params)
}

fn query_list<T, F>(conn: &Connection, sql: &str, params: Vec<i64>, map: F) -> Result<Vec<T>>
where
    F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), map)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_user_by_id(conn: &Connection, uid: u64) -> Result<Option<UserInfo>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"))?;
    let row = stmt
        .query_row([to_sql_int(uid)], |row| user_from_row(row, 0))
        .optional()?;
    Ok(row)
}

fn query_user_by_did(conn: &Connection, did: &str) -> Result<Option<UserInfo>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE did = ?1"))?;
    let row = stmt.query_row([did], |row| user_from_row(row, 0)).optional()?;
    Ok(row)
}

fn query_post(conn: &Connection, channel_id: u64, post_id: u64) -> Result<Option<PostInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts p WHERE p.channel_id = ?1 AND p.post_id = ?2"
    ))?;
    let row = stmt
        .query_row([to_sql_int(channel_id), to_sql_int(post_id)], post_from_row)
        .optional()?;
    Ok(row)
}

fn query_comment(
    conn: &Connection,
    channel_id: u64,
    post_id: u64,
    comment_id: u64,
) -> Result<Option<CommentInfo>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.user_id = c.user_id
         WHERE c.channel_id = ?1 AND c.post_id = ?2 AND c.comment_id = ?3"
    ))?;
    let row = stmt
        .query_row(
            [to_sql_int(channel_id), to_sql_int(post_id), to_sql_int(comment_id)],
            comment_from_row,
        )
        .optional()?;
    Ok(row)
}

fn touch_channel(conn: &Connection, channel_id: u64, now: u64) -> Result<()> {
    conn.execute(
        "UPDATE channels SET updated_at = ?2 WHERE channel_id = ?1",
        [to_sql_int(channel_id), to_sql_int(now)],
    )?;
    Ok(())
}

/// Apply `expr` to the likes column of the liked post or comment and return the new total.
fn adjust_likes(conn: &Connection, channel_id: u64, post_id: u64, comment_id: u64, expr: &str) -> Result<u64> {
    let total: i64 = if comment_id == 0 {
        conn.execute(
            &format!("UPDATE posts SET likes = {expr} WHERE channel_id = ?1 AND post_id = ?2"),
            [to_sql_int(channel_id), to_sql_int(post_id)],
        )?;
        conn.query_row(
            "SELECT likes FROM posts WHERE channel_id = ?1 AND post_id = ?2",
            [to_sql_int(channel_id), to_sql_int(post_id)],
            |row| row.get(0),
        )?
    } else {
        let ids = [to_sql_int(channel_id), to_sql_int(post_id), to_sql_int(comment_id)];
        conn.execute(
            &format!(
                "UPDATE comments SET likes = {expr} WHERE channel_id = ?1 AND post_id = ?2 AND comment_id = ?3"
            ),
            ids,
        )?;
        conn.query_row(
            "SELECT likes FROM comments WHERE channel_id = ?1 AND post_id = ?2 AND comment_id = ?3",
            ids,
            |row| row.get(0),
        )?
    };
    Ok(u64::try_from(total)?)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, ChannelInfo) {
        let db = Database::open_in_memory().unwrap();
        db.ensure_owner("did:elastos:owner", "owner").unwrap();
        let channel = ChannelInfo {
            id: 1,
            name: "tech".into(),
            intro: "tech news".into(),
            owner_uid: OWNER_USER_ID,
            created_at: 10,
            updated_at: 10,
            subscriber_count: 0,
            next_post_id: 1,
            avatar: vec![0xAB],
        };
        db.insert_channel(&channel).unwrap();
        (db, channel)
    }

    fn add_user(db: &Database, name: &str) -> UserInfo {
        db.get_or_create_user(&format!("did:elastos:{name}"), name, "")
            .unwrap()
            .0
    }

    #[test]
    fn owner_is_seeded_once_as_user_one() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.ensure_owner("did:elastos:owner", "owner").unwrap();
        assert_eq!(owner.uid, OWNER_USER_ID);
        assert!(db.ensure_owner("did:elastos:owner", "owner").is_ok());
        assert!(db.ensure_owner("did:elastos:other", "owner").is_err());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn users_are_created_once_per_did() {
        let (db, _) = setup();
        let (alice, created) = db.get_or_create_user("did:elastos:alice", "alice", "").unwrap();
        assert!(created);
        assert_eq!(alice.uid, 2);

        let (again, created) = db
            .get_or_create_user("did:elastos:alice", "Alice", "a@example.com")
            .unwrap();
        assert!(!created);
        assert_eq!(again.uid, 2);
        assert_eq!(db.get_user(2).unwrap().unwrap().name, "Alice");
        assert_eq!(db.count_users().unwrap(), 2);
    }

    #[test]
    fn channels_round_trip_through_load() {
        let (db, mut channel) = setup();
        channel.name = "technology".into();
        channel.updated_at = 20;
        db.update_channel(&channel).unwrap();

        let loaded = db.load_channels().unwrap();
        assert_eq!(loaded, vec![channel]);

        let mut missing = loaded[0].clone();
        missing.id = 99;
        assert!(db.update_channel(&missing).is_err());
    }

    #[test]
    fn subscription_updates_channel_counter() {
        let (db, channel) = setup();
        let alice = add_user(&db, "alice");

        db.subscribe(alice.uid, channel.id).unwrap();
        assert!(db.is_subscribed(alice.uid, channel.id).unwrap());
        assert!(db.subscribe(alice.uid, channel.id).is_err());
        assert_eq!(db.subscriptions_of(alice.uid).unwrap(), vec![channel.id]);
        assert_eq!(db.load_channels().unwrap()[0].subscriber_count, 1);

        db.unsubscribe(alice.uid, channel.id).unwrap();
        assert!(!db.is_subscribed(alice.uid, channel.id).unwrap());
        assert!(db.unsubscribe(alice.uid, channel.id).is_err());
        assert_eq!(db.load_channels().unwrap()[0].subscriber_count, 0);
    }

    #[test]
    fn negative_subscription_ids_are_rejected() {
        let (db, channel) = setup();
        let alice = add_user(&db, "alice");
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (channel_id, name, intro, owner_id, created_at, updated_at, next_post_id, avatar)
                 VALUES (-5, 'broken', '', 1, 0, 0, 1, x'')",
                [],
            )?;
            conn.execute(
                "INSERT INTO subscriptions (user_id, channel_id, created_at) VALUES (?1, -5, 0)",
                [to_sql_int(alice.uid)],
            )?;
            Ok(())
        })
        .unwrap();
        assert!(db.subscriptions_of(alice.uid).is_err());

        let bob = add_user(&db, "bob");
        db.subscribe(bob.uid, channel.id).unwrap();
        assert_eq!(db.subscriptions_of(bob.uid).unwrap(), vec![channel.id]);
    }

    #[test]
    fn post_lifecycle() {
        let (db, channel) = setup();
        let post = db.insert_post(channel.id, 1, b"first", 20).unwrap();
        assert_eq!(db.get_post(channel.id, 1).unwrap(), Some(post));
        assert_eq!(db.load_channels().unwrap()[0].next_post_id, 2);

        let edited = db.update_post_content(channel.id, 1, b"edited", 30).unwrap().unwrap();
        assert_eq!(edited.content, b"edited");
        assert_eq!(edited.updated_at, 30);

        let deleted = db.delete_post(channel.id, 1, 40).unwrap().unwrap();
        assert_eq!(deleted.status, PostStatus::Deleted);
        assert!(deleted.content.is_empty());

        assert!(db.update_post_content(channel.id, 1, b"again", 50).unwrap().is_none());
        assert!(db.delete_post(channel.id, 1, 50).unwrap().is_none());
        assert_eq!(db.load_channels().unwrap()[0].updated_at, 40);
    }

    #[test]
    fn list_queries_filter_and_order_descending() {
        let (db, channel) = setup();
        for id in 1..=5 {
            db.insert_post(channel.id, id, b"x", 100 + id).unwrap();
        }

        let ids = |posts: Vec<PostInfo>| posts.into_iter().map(|p| p.post_id).collect::<Vec<_>>();

        let all = db.get_posts(channel.id, &QueryCriteria::default()).unwrap();
        assert_eq!(ids(all), vec![5, 4, 3, 2, 1]);

        let ranged = QueryCriteria {
            by: QueryField::Id,
            upper: 4,
            lower: 2,
            max_count: 0,
        };
        assert_eq!(ids(db.get_posts(channel.id, &ranged).unwrap()), vec![4, 3, 2]);

        let capped = QueryCriteria {
            by: QueryField::CreatedAt,
            upper: 0,
            lower: 102,
            max_count: 2,
        };
        assert_eq!(ids(db.get_posts(channel.id, &capped).unwrap()), vec![5, 4]);
    }

    #[test]
    fn comments_get_per_post_ids_and_statuses() {
        let (db, channel) = setup();
        let alice = add_user(&db, "alice");
        db.insert_post(channel.id, 1, b"post", 20).unwrap();

        let first = db.insert_comment(channel.id, 1, 0, alice.uid, b"hi", 21).unwrap();
        let reply = db
            .insert_comment(channel.id, 1, first.comment_id, alice.uid, b"re", 22)
            .unwrap();
        assert_eq!((first.comment_id, reply.comment_id), (1, 2));
        assert_eq!(reply.reply_to, 1);
        assert_eq!(reply.user, alice);
        assert_eq!(db.get_post(channel.id, 1).unwrap().unwrap().comment_count, 2);

        let blocked = db
            .set_comment_status(channel.id, 1, 1, CommentStatus::Blocked, 23)
            .unwrap()
            .unwrap();
        assert_eq!(blocked.status, CommentStatus::Blocked);
        assert_eq!(blocked.content, b"hi");

        let deleted = db
            .set_comment_status(channel.id, 1, 2, CommentStatus::Deleted, 24)
            .unwrap()
            .unwrap();
        assert!(deleted.content.is_empty());

        let listed = db.get_comments(channel.id, 1, &QueryCriteria::default()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].comment_id, 2);
    }

    #[test]
    fn likes_are_counted_once_per_user() {
        let (db, channel) = setup();
        let alice = add_user(&db, "alice");
        let bob = add_user(&db, "bob");
        db.insert_post(channel.id, 1, b"post", 20).unwrap();

        assert_eq!(db.add_like(alice.uid, channel.id, 1, 0, 21).unwrap(), Some(1));
        assert_eq!(db.add_like(bob.uid, channel.id, 1, 0, 21).unwrap(), Some(2));
        assert_eq!(db.add_like(bob.uid, channel.id, 1, 0, 22).unwrap(), None);

        let liked = db.get_liked_posts(bob.uid, &QueryCriteria::default()).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].likes, 2);

        assert_eq!(db.remove_like(bob.uid, channel.id, 1, 0).unwrap(), Some(1));
        assert_eq!(db.remove_like(bob.uid, channel.id, 1, 0).unwrap(), None);

        db.insert_comment(channel.id, 1, 0, alice.uid, b"c", 23).unwrap();
        assert_eq!(db.add_like(bob.uid, channel.id, 1, 1, 24).unwrap(), Some(1));
        assert_eq!(db.get_comment(channel.id, 1, 1).unwrap().unwrap().likes, 1);
    }

    #[test]
    fn subscribed_channels_only_lists_subscriptions() {
        let (db, channel) = setup();
        let alice = add_user(&db, "alice");
        let other = ChannelInfo {
            id: 2,
            name: "news".into(),
            ..channel.clone()
        };
        db.insert_channel(&other).unwrap();
        db.subscribe(alice.uid, 2).unwrap();

        let subscribed = db
            .get_subscribed_channels(alice.uid, &QueryCriteria::default())
            .unwrap();
        assert_eq!(subscribed.len(), 1);
        assert_eq!(subscribed[0].id, 2);
        assert_eq!(db.get_channels(&QueryCriteria::default()).unwrap().len(), 2);
    }
}
