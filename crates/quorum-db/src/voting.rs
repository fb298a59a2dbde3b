//! Vote ledger and answer acceptance.
//!
//! Both operations maintain an exclusive-marker invariant: a user holds at
//! most one vote row per item, and a question has at most one accepted
//! answer. Each is applied as a single transaction so the ledger and the
//! displayed aggregate can never diverge, and no reader observes a state
//! with zero or two markers set.

use rusqlite::Transaction;
use uuid::Uuid;

use crate::Database;
use crate::error::{OptionalExt, Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Question,
    Answer,
}

impl ContentType {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "question" => Ok(Self::Question),
            "answer" => Ok(Self::Answer),
            other => Err(StoreError::InvalidContentType(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Question => "questions",
            Self::Answer => "answers",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(StoreError::InvalidDirection(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    fn unit(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl Database {
    /// Cast, flip, or retract a vote. Returns the item's new vote total.
    ///
    /// Casting the same direction a second time removes the vote (toggle);
    /// casting the opposite direction flips the ledger row in place. The
    /// ledger mutation and the aggregate delta commit together.
    pub fn cast_vote(
        &self,
        user_id: &str,
        content_type: ContentType,
        content_id: &str,
        direction: VoteDirection,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let total = apply_vote(&tx, user_id, content_type, content_id, direction)?;
            tx.commit()?;
            Ok(total)
        })
    }

    /// Mark an answer as the accepted solution for its question.
    ///
    /// Only the question's author may accept. Clearing the previous accepted
    /// answer and setting the new one happen in one transaction, so at most
    /// one sibling ever reads as accepted. Re-accepting the current answer
    /// is a no-op that still succeeds.
    pub fn accept_answer(&self, answer_id: &str, requesting_user_id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let target: Option<(String, String)> = tx
                .query_row(
                    "SELECT a.question_id, q.user_id
                     FROM answers a
                     JOIN questions q ON a.question_id = q.id
                     WHERE a.id = ?1",
                    [answer_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (question_id, question_author) = target.ok_or(StoreError::NotFound("answer"))?;
            if question_author != requesting_user_id {
                return Err(StoreError::Forbidden);
            }

            tx.execute(
                "UPDATE answers SET accepted = 0 WHERE question_id = ?1 AND id <> ?2",
                (&question_id, answer_id),
            )?;
            tx.execute("UPDATE answers SET accepted = 1 WHERE id = ?1", [answer_id])?;

            tx.commit()?;
            Ok(())
        })
    }
}

fn apply_vote(
    tx: &Transaction,
    user_id: &str,
    content_type: ContentType,
    content_id: &str,
    direction: VoteDirection,
) -> Result<i64> {
    let table = content_type.table();

    // The target must exist before the ledger is touched.
    let current: Option<i64> = tx
        .query_row(
            &format!("SELECT votes FROM {} WHERE id = ?1", table),
            [content_id],
            |row| row.get(0),
        )
        .optional()?;
    if current.is_none() {
        return Err(StoreError::NotFound(content_type.as_str()));
    }

    let prior: Option<(String, String)> = tx
        .query_row(
            "SELECT id, direction FROM votes
             WHERE user_id = ?1 AND content_type = ?2 AND content_id = ?3",
            (user_id, content_type.as_str(), content_id),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let delta = match prior {
        None => {
            tx.execute(
                "INSERT INTO votes (id, user_id, content_type, content_id, direction)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (
                    Uuid::new_v4().to_string(),
                    user_id,
                    content_type.as_str(),
                    content_id,
                    direction.as_str(),
                ),
            )?;
            direction.unit()
        }
        Some((vote_id, old)) if old == direction.as_str() => {
            // Toggle-off: retract the vote entirely.
            tx.execute("DELETE FROM votes WHERE id = ?1", [&vote_id])?;
            -direction.unit()
        }
        Some((vote_id, old)) => {
            // Flip: the aggregate sheds the old direction and gains the new.
            let old_direction = VoteDirection::parse(&old)?;
            tx.execute(
                "UPDATE votes SET direction = ?1 WHERE id = ?2",
                (direction.as_str(), &vote_id),
            )?;
            direction.unit() - old_direction.unit()
        }
    };

    tx.execute(
        &format!("UPDATE {} SET votes = votes + ?1 WHERE id = ?2", table),
        (delta, content_id),
    )?;

    let total = tx.query_row(
        &format!("SELECT votes FROM {} WHERE id = ?1", table),
        [content_id],
        |row| row.get(0),
    )?;
    Ok(total)
}
