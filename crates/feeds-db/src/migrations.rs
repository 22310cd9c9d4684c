use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            user_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            did         TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS channels (
            channel_id      INTEGER PRIMARY KEY,
            name            TEXT NOT NULL UNIQUE,
            intro           TEXT NOT NULL,
            owner_id        INTEGER NOT NULL REFERENCES users(user_id),
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL,
            subscribers     INTEGER NOT NULL DEFAULT 0,
            next_post_id    INTEGER NOT NULL,
            avatar          BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            channel_id      INTEGER NOT NULL REFERENCES channels(channel_id),
            post_id         INTEGER NOT NULL,
            status          INTEGER NOT NULL DEFAULT 0,
            content         BLOB NOT NULL,
            comments        INTEGER NOT NULL DEFAULT 0,
            likes           INTEGER NOT NULL DEFAULT 0,
            next_comment_id INTEGER NOT NULL,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL,
            PRIMARY KEY (channel_id, post_id)
        );

        CREATE INDEX IF NOT EXISTS idx_posts_updated
            ON posts(channel_id, updated_at);

        CREATE TABLE IF NOT EXISTS comments (
            channel_id      INTEGER NOT NULL,
            post_id         INTEGER NOT NULL,
            comment_id      INTEGER NOT NULL,
            refcomment_id   INTEGER NOT NULL DEFAULT 0,
            status          INTEGER NOT NULL DEFAULT 0,
            user_id         INTEGER NOT NULL REFERENCES users(user_id),
            content         BLOB NOT NULL,
            likes           INTEGER NOT NULL DEFAULT 0,
            created_at      INTEGER NOT NULL,
            updated_at      INTEGER NOT NULL,
            PRIMARY KEY (channel_id, post_id, comment_id),
            FOREIGN KEY (channel_id, post_id) REFERENCES posts(channel_id, post_id)
        );

        CREATE TABLE IF NOT EXISTS likes (
            user_id     INTEGER NOT NULL REFERENCES users(user_id),
            channel_id  INTEGER NOT NULL,
            post_id     INTEGER NOT NULL,
            comment_id  INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL,
            PRIMARY KEY (user_id, channel_id, post_id, comment_id)
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            user_id     INTEGER NOT NULL REFERENCES users(user_id),
            channel_id  INTEGER NOT NULL REFERENCES channels(channel_id),
            created_at  INTEGER NOT NULL,
            PRIMARY KEY (user_id, channel_id)
        );

        CREATE INDEX IF NOT EXISTS idx_subscriptions_channel
            ON subscriptions(channel_id);

        CREATE TABLE IF NOT EXISTS reported_comments (
            channel_id  INTEGER NOT NULL,
            post_id     INTEGER NOT NULL,
            comment_id  INTEGER NOT NULL,
            reporter_id INTEGER NOT NULL REFERENCES users(user_id),
            reasons     TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            PRIMARY KEY (channel_id, post_id, comment_id, reporter_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
