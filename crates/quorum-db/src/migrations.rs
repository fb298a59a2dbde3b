use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// Tags every fresh install starts with. Posting a question with a new tag
/// still creates it on the fly.
const DEFAULT_TAGS: &[&str] = &[
    "rust",
    "javascript",
    "python",
    "sql",
    "docker",
    "git",
    "testing",
    "networking",
    "security",
    "performance",
    "debugging",
    "deployment",
];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'user',
            banned      INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS questions (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            description TEXT NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id),
            votes       INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS answers (
            id          TEXT PRIMARY KEY,
            question_id TEXT NOT NULL REFERENCES questions(id),
            user_id     TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            votes       INTEGER NOT NULL DEFAULT 0,
            accepted    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_answers_question
            ON answers(question_id);

        CREATE TABLE IF NOT EXISTS tags (
            id   TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS question_tags (
            question_id TEXT NOT NULL REFERENCES questions(id),
            tag_id      TEXT NOT NULL REFERENCES tags(id),
            PRIMARY KEY (question_id, tag_id)
        );

        -- One vote per user per item; the aggregate on the target row is
        -- updated in the same transaction as this ledger.
        CREATE TABLE IF NOT EXISTS votes (
            id           TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL REFERENCES users(id),
            content_type TEXT NOT NULL,
            content_id   TEXT NOT NULL,
            direction    TEXT NOT NULL,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, content_type, content_id)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            kind        TEXT NOT NULL,
            message     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            question_id TEXT REFERENCES questions(id),
            answer_id   TEXT REFERENCES answers(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_id, created_at);

        CREATE TABLE IF NOT EXISTS platform_messages (
            id          TEXT PRIMARY KEY,
            message     TEXT NOT NULL,
            active      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Seed the welcome banner
        INSERT OR IGNORE INTO platform_messages (id, message)
            VALUES ('00000000-0000-0000-0000-000000000001',
                    'Welcome to Quorum! Please read the community guidelines before posting.');
        ",
    )?;

    let mut stmt = conn.prepare("INSERT OR IGNORE INTO tags (id, name) VALUES (?1, ?2)")?;
    for tag in DEFAULT_TAGS {
        stmt.execute((Uuid::new_v4().to_string(), tag))?;
    }

    info!("Database migrations complete");
    Ok(())
}
