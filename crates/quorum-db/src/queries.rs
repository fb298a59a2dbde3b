use rusqlite::Connection;
use uuid::Uuid;

use crate::Database;
use crate::error::{OptionalExt, Result, StoreError};
use crate::models::{
    AnswerRow, NotificationRow, PlatformMessageRow, QuestionRow, QuestionTagRow, UserRow,
};

/// Filter for the public question listing.
#[derive(Debug, Default)]
pub struct QuestionFilter {
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub sort: QuestionSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSort {
    #[default]
    Newest,
    Oldest,
    Votes,
}

impl QuestionSort {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "votes" => Ok(Self::Votes),
            other => Err(StoreError::InvalidSort(other.to_string())),
        }
    }

    /// Ties always fall back to rowid, i.e. insertion order, so listings are
    /// deterministic even when timestamps or totals collide.
    fn order_clause(self) -> &'static str {
        match self {
            Self::Newest => "q.created_at DESC, q.rowid ASC",
            Self::Oldest => "q.created_at ASC, q.rowid ASC",
            Self::Votes => "q.votes DESC, q.rowid ASC",
        }
    }
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, username, email, password_hash, role),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, role, banned, created_at
                 FROM users ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map([], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_user_banned(&self, id: &str, banned: bool) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET banned = ?1 WHERE id = ?2",
                (banned, id),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("user"));
            }
            Ok(())
        })
    }

    // -- Questions --

    /// Insert a question together with its tags. Tags are upserted by name so
    /// posting with a new tag creates it on the fly.
    pub fn create_question(
        &self,
        id: &str,
        title: &str,
        description: &str,
        author_id: &str,
        tags: &[String],
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO questions (id, title, description, user_id) VALUES (?1, ?2, ?3, ?4)",
                (id, title, description, author_id),
            )?;
            for tag in tags {
                tx.execute(
                    "INSERT OR IGNORE INTO tags (id, name) VALUES (?1, ?2)",
                    (Uuid::new_v4().to_string(), tag),
                )?;
                let tag_id: String =
                    tx.query_row("SELECT id FROM tags WHERE name = ?1", [tag], |row| row.get(0))?;
                tx.execute(
                    "INSERT OR IGNORE INTO question_tags (question_id, tag_id) VALUES (?1, ?2)",
                    (id, &tag_id),
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_question(&self, id: &str) -> Result<Option<QuestionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT q.id, q.title, q.description, q.user_id, u.username, q.votes, q.created_at
                 FROM questions q
                 JOIN users u ON q.user_id = u.id
                 WHERE q.id = ?1",
            )?;
            stmt.query_row([id], map_question_row).optional()
        })
    }

    pub fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRow>> {
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT q.id, q.title, q.description, q.user_id, u.username, q.votes, q.created_at
                 FROM questions q
                 JOIN users u ON q.user_id = u.id",
            );

            let mut conditions: Vec<String> = Vec::new();
            let mut params: Vec<String> = Vec::new();

            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", search);
                conditions.push("(q.title LIKE ? OR q.description LIKE ?)".into());
                params.push(pattern.clone());
                params.push(pattern);
            }

            if !filter.tags.is_empty() {
                let placeholders = vec!["?"; filter.tags.len()].join(", ");
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM question_tags qt
                             JOIN tags t ON qt.tag_id = t.id
                             WHERE qt.question_id = q.id AND t.name IN ({}))",
                    placeholders
                ));
                params.extend(filter.tags.iter().cloned());
            }

            if !conditions.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&conditions.join(" AND "));
            }

            sql.push_str(" ORDER BY ");
            sql.push_str(filter.sort.order_clause());

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), map_question_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch tag names for a page of questions.
    pub fn tags_for_questions(&self, question_ids: &[String]) -> Result<Vec<QuestionTagRow>> {
        if question_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=question_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT qt.question_id, t.name
                 FROM question_tags qt
                 JOIN tags t ON qt.tag_id = t.id
                 WHERE qt.question_id IN ({})
                 ORDER BY t.name",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = question_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(QuestionTagRow {
                        question_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Answers --

    pub fn create_answer(
        &self,
        id: &str,
        question_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let exists: Option<String> = conn
                .query_row("SELECT id FROM questions WHERE id = ?1", [question_id], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound("question"));
            }

            conn.execute(
                "INSERT INTO answers (id, question_id, user_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, question_id, author_id, content),
            )?;
            Ok(())
        })
    }

    /// Answers for a question: accepted first, then by score.
    pub fn list_answers(&self, question_id: &str) -> Result<Vec<AnswerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.question_id, a.user_id, u.username, a.content, a.votes,
                        a.accepted, a.created_at
                 FROM answers a
                 JOIN users u ON a.user_id = u.id
                 WHERE a.question_id = ?1
                 ORDER BY a.accepted DESC, a.votes DESC, a.rowid ASC",
            )?;
            let rows = stmt
                .query_map([question_id], |row| {
                    Ok(AnswerRow {
                        id: row.get(0)?,
                        question_id: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row.get(3)?,
                        content: row.get(4)?,
                        votes: row.get(5)?,
                        accepted: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notifications --

    /// Notify the question author that a new answer landed. Self-answers
    /// produce nothing. Returns whether a notification was written.
    pub fn notify_answer_created(&self, answer_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let target: Option<(String, String, String)> = conn
                .query_row(
                    "SELECT a.user_id, a.question_id, q.user_id
                     FROM answers a
                     JOIN questions q ON a.question_id = q.id
                     WHERE a.id = ?1",
                    [answer_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let (answer_author, question_id, question_author) =
                target.ok_or(StoreError::NotFound("answer"))?;

            if answer_author == question_author {
                return Ok(false);
            }

            conn.execute(
                "INSERT INTO notifications (id, user_id, kind, message, question_id, answer_id)
                 VALUES (?1, ?2, 'answer', 'Someone answered your question', ?3, ?4)",
                (
                    Uuid::new_v4().to_string(),
                    &question_author,
                    &question_id,
                    answer_id,
                ),
            )?;
            Ok(true)
        })
    }

    pub fn notifications_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, kind, message, read, question_id, answer_id, created_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        kind: row.get(2)?,
                        message: row.get(3)?,
                        read: row.get(4)?,
                        question_id: row.get(5)?,
                        answer_id: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Marking someone else's notification is a silent no-op.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2",
                (id, user_id),
            )?;
            Ok(())
        })
    }

    // -- Tags --

    pub fn list_tags(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Platform messages --

    pub fn create_platform_message(&self, id: &str, message: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO platform_messages (id, message) VALUES (?1, ?2)",
                (id, message),
            )?;
            Ok(())
        })
    }

    pub fn active_platform_messages(&self) -> Result<Vec<PlatformMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, message, active, created_at
                 FROM platform_messages
                 WHERE active = 1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PlatformMessageRow {
                        id: row.get(0)?,
                        message: row.get(1)?,
                        active: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_platform_message_active(&self, id: &str, active: bool) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE platform_messages SET active = ?1 WHERE id = ?2",
                (active, id),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("platform message"));
            }
            Ok(())
        })
    }

    pub fn delete_platform_message(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM platform_messages WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(StoreError::NotFound("platform message"));
            }
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, email, password, role, banned, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([value], map_user_row).optional()
}

fn map_user_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        banned: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn map_question_row(row: &rusqlite::Row) -> rusqlite::Result<QuestionRow> {
    Ok(QuestionRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
        votes: row.get(5)?,
        created_at: row.get(6)?,
    })
}
