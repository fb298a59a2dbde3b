/// Database row types — these map directly to SQLite rows.
/// Distinct from the quorum-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub banned: bool,
    pub created_at: String,
}

pub struct QuestionRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub author_username: String,
    pub votes: i64,
    pub created_at: String,
}

pub struct AnswerRow {
    pub id: String,
    pub question_id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub votes: i64,
    pub accepted: bool,
    pub created_at: String,
}

pub struct QuestionTagRow {
    pub question_id: String,
    pub name: String,
}

pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub question_id: Option<String>,
    pub answer_id: Option<String>,
    pub created_at: String,
}

pub struct PlatformMessageRow {
    pub id: String,
    pub message: String,
    pub active: bool,
    pub created_at: String,
}
