//! Integration tests for the store against an in-memory database.

use crate::error::StoreError;
use crate::queries::{QuestionFilter, QuestionSort};
use crate::voting::{ContentType, VoteDirection};

use self::support::{seed_answer, seed_question, seed_question_with, seed_user, store};

pub(crate) mod support {
    use crate::Database;
    use uuid::Uuid;

    pub fn store() -> Database {
        Database::open_in_memory().expect("in-memory store")
    }

    pub fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let email = format!("{}@example.com", username);
        db.create_user(&id, username, &email, "not-a-real-hash", "user")
            .unwrap();
        id
    }

    pub fn seed_question(db: &Database, author_id: &str) -> String {
        seed_question_with(db, author_id, "How do I test this?", "A question body.", &[])
    }

    pub fn seed_question_with(
        db: &Database,
        author_id: &str,
        title: &str,
        description: &str,
        tags: &[&str],
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        db.create_question(&id, title, description, author_id, &tags)
            .unwrap();
        id
    }

    pub fn seed_answer(db: &Database, question_id: &str, author_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_answer(&id, question_id, author_id, "An answer.")
            .unwrap();
        id
    }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[test]
fn create_and_fetch_user() {
    let db = store();
    let id = seed_user(&db, "alice");

    let user = db.get_user_by_username("alice").unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, "user");
    assert!(!user.banned);

    assert!(db.get_user_by_id(&id).unwrap().is_some());
    assert!(db.get_user_by_email("alice@example.com").unwrap().is_some());
    assert!(db.get_user_by_username("nobody").unwrap().is_none());
}

#[test]
fn duplicate_username_is_rejected() {
    let db = store();
    seed_user(&db, "alice");

    let err = db
        .create_user("other-id", "alice", "alice2@example.com", "hash", "user")
        .unwrap_err();
    assert!(matches!(err, StoreError::Sqlite(_)));
}

#[test]
fn ban_and_unban_user() {
    let db = store();
    let id = seed_user(&db, "alice");

    db.set_user_banned(&id, true).unwrap();
    assert!(db.get_user_by_id(&id).unwrap().unwrap().banned);

    db.set_user_banned(&id, false).unwrap();
    assert!(!db.get_user_by_id(&id).unwrap().unwrap().banned);

    let err = db.set_user_banned("no-such-id", true).unwrap_err();
    assert!(matches!(err, StoreError::NotFound("user")));
}

#[test]
fn list_users_in_insertion_order() {
    let db = store();
    seed_user(&db, "alice");
    seed_user(&db, "bob");
    seed_user(&db, "carol");

    let users = db.list_users().unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
}

// ─── Questions and tags ──────────────────────────────────────────────────────

#[test]
fn question_roundtrip_with_tags() {
    let db = store();
    let author = seed_user(&db, "alice");
    let q = seed_question_with(&db, &author, "Borrow checker woes", "Why does this not compile?", &["rust", "borrowck"]);

    let row = db.get_question(&q).unwrap().unwrap();
    assert_eq!(row.title, "Borrow checker woes");
    assert_eq!(row.author_username, "alice");
    assert_eq!(row.votes, 0);

    let tags = db.tags_for_questions(&[q.clone()]).unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["borrowck", "rust"]);

    assert!(db.get_question("no-such-id").unwrap().is_none());
}

#[test]
fn tags_are_upserted_by_name() {
    let db = store();
    let author = seed_user(&db, "alice");
    seed_question_with(&db, &author, "First", "body", &["borrowck"]);
    seed_question_with(&db, &author, "Second", "body", &["borrowck"]);

    let count = db
        .list_tags()
        .unwrap()
        .iter()
        .filter(|name| name.as_str() == "borrowck")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn search_matches_title_and_description_case_insensitively() {
    let db = store();
    let author = seed_user(&db, "alice");
    let by_title = seed_question_with(&db, &author, "Understanding BORROWCK errors", "body", &[]);
    let by_desc = seed_question_with(&db, &author, "Compile failure", "the borrowck rejects this", &[]);
    seed_question_with(&db, &author, "Unrelated", "nothing to see", &[]);

    let filter = QuestionFilter {
        search: Some("borrowck".into()),
        ..Default::default()
    };
    let rows = db.list_questions(&filter).unwrap();
    let ids: Vec<&str> = rows.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&by_title.as_str()));
    assert!(ids.contains(&by_desc.as_str()));
}

#[test]
fn tag_filter_requires_at_least_one_match() {
    let db = store();
    let author = seed_user(&db, "alice");
    let tagged = seed_question_with(&db, &author, "First", "body", &["rust", "testing"]);
    seed_question_with(&db, &author, "Second", "body", &["python"]);
    seed_question_with(&db, &author, "Third", "body", &[]);

    let filter = QuestionFilter {
        tags: vec!["rust".into(), "docker".into()],
        ..Default::default()
    };
    let rows = db.list_questions(&filter).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, tagged);
}

#[test]
fn votes_sort_is_non_increasing_with_insertion_order_ties() {
    let db = store();
    let author = seed_user(&db, "alice");
    let voters: Vec<String> = ["u1", "u2", "u3"].iter().map(|n| seed_user(&db, n)).collect();

    let q_low = seed_question(&db, &author);
    let q_high = seed_question(&db, &author);
    let q_tied = seed_question(&db, &author);

    for voter in &voters {
        db.cast_vote(voter, ContentType::Question, &q_high, VoteDirection::Up)
            .unwrap();
    }
    db.cast_vote(&voters[0], ContentType::Question, &q_tied, VoteDirection::Down)
        .unwrap();

    let filter = QuestionFilter {
        sort: QuestionSort::Votes,
        ..Default::default()
    };
    let rows = db.list_questions(&filter).unwrap();
    let totals: Vec<i64> = rows.iter().map(|q| q.votes).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));
    // q_low and a 0-vote tie would sort by insertion; here the exact order is
    // high (3), low (0), tied (-1).
    let ids: Vec<&str> = rows.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec![q_high.as_str(), q_low.as_str(), q_tied.as_str()]);
}

#[test]
fn timestamp_ties_fall_back_to_insertion_order() {
    // Same-second inserts tie on created_at; rowid keeps listings stable.
    let db = store();
    let author = seed_user(&db, "alice");
    let q1 = seed_question(&db, &author);
    let q2 = seed_question(&db, &author);
    let q3 = seed_question(&db, &author);

    let oldest = db
        .list_questions(&QuestionFilter {
            sort: QuestionSort::Oldest,
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = oldest.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec![q1.as_str(), q2.as_str(), q3.as_str()]);
}

#[test]
fn sort_parse_rejects_unknown_keys() {
    assert!(matches!(
        QuestionSort::parse("controversial"),
        Err(StoreError::InvalidSort(_))
    ));
}

// ─── Answers ─────────────────────────────────────────────────────────────────

#[test]
fn answer_on_missing_question_is_not_found() {
    let db = store();
    let author = seed_user(&db, "alice");

    let err = db
        .create_answer("answer-id", "no-such-question", &author, "text")
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound("question")));
}

#[test]
fn answers_list_accepted_first_then_by_score() {
    let db = store();
    let asker = seed_user(&db, "asker");
    let other = seed_user(&db, "other");
    let voter = seed_user(&db, "voter");
    let q = seed_question(&db, &asker);

    let plain = seed_answer(&db, &q, &other);
    let upvoted = seed_answer(&db, &q, &other);
    let accepted = seed_answer(&db, &q, &other);

    db.cast_vote(&voter, ContentType::Answer, &upvoted, VoteDirection::Up)
        .unwrap();
    db.accept_answer(&accepted, &asker).unwrap();

    let rows = db.list_answers(&q).unwrap();
    let ids: Vec<&str> = rows.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec![accepted.as_str(), upvoted.as_str(), plain.as_str()]);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[test]
fn answering_someone_elses_question_notifies_them() {
    let db = store();
    let asker = seed_user(&db, "asker");
    let answerer = seed_user(&db, "answerer");
    let q = seed_question(&db, &asker);
    let a = seed_answer(&db, &q, &answerer);

    assert!(db.notify_answer_created(&a).unwrap());

    let rows = db.notifications_for_user(&asker, 50).unwrap();
    assert_eq!(rows.len(), 1);
    let n = &rows[0];
    assert_eq!(n.kind, "answer");
    assert!(!n.read);
    assert_eq!(n.question_id.as_deref(), Some(q.as_str()));
    assert_eq!(n.answer_id.as_deref(), Some(a.as_str()));

    // The answerer gets nothing.
    assert!(db.notifications_for_user(&answerer, 50).unwrap().is_empty());
}

#[test]
fn self_answers_do_not_notify() {
    let db = store();
    let asker = seed_user(&db, "asker");
    let q = seed_question(&db, &asker);
    let a = seed_answer(&db, &q, &asker);

    assert!(!db.notify_answer_created(&a).unwrap());
    assert!(db.notifications_for_user(&asker, 50).unwrap().is_empty());
}

#[test]
fn notify_for_missing_answer_is_not_found() {
    let db = store();
    let err = db.notify_answer_created("no-such-id").unwrap_err();
    assert!(matches!(err, StoreError::NotFound("answer")));
}

#[test]
fn notifications_list_newest_first_with_limit() {
    let db = store();
    let asker = seed_user(&db, "asker");
    let answerer = seed_user(&db, "answerer");
    let q = seed_question(&db, &asker);

    let first = seed_answer(&db, &q, &answerer);
    let second = seed_answer(&db, &q, &answerer);
    db.notify_answer_created(&first).unwrap();
    db.notify_answer_created(&second).unwrap();

    let rows = db.notifications_for_user(&asker, 50).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].answer_id.as_deref(), Some(second.as_str()));

    let rows = db.notifications_for_user(&asker, 1).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn marking_read_only_touches_the_owners_row() {
    let db = store();
    let asker = seed_user(&db, "asker");
    let answerer = seed_user(&db, "answerer");
    let q = seed_question(&db, &asker);
    let a = seed_answer(&db, &q, &answerer);
    db.notify_answer_created(&a).unwrap();

    let n_id = db.notifications_for_user(&asker, 50).unwrap()[0].id.clone();

    // Someone else marking it read is a no-op.
    db.mark_notification_read(&n_id, &answerer).unwrap();
    assert!(!db.notifications_for_user(&asker, 50).unwrap()[0].read);

    db.mark_notification_read(&n_id, &asker).unwrap();
    assert!(db.notifications_for_user(&asker, 50).unwrap()[0].read);
}

// ─── Platform messages ───────────────────────────────────────────────────────

#[test]
fn platform_message_lifecycle() {
    let db = store();

    // The migration seeds a welcome banner.
    let seeded = db.active_platform_messages().unwrap();
    assert_eq!(seeded.len(), 1);

    db.create_platform_message("banner-id", "Maintenance window on Sunday")
        .unwrap();
    let active = db.active_platform_messages().unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].message, "Maintenance window on Sunday");

    db.set_platform_message_active("banner-id", false).unwrap();
    assert_eq!(db.active_platform_messages().unwrap().len(), 1);

    db.delete_platform_message("banner-id").unwrap();
    let err = db.delete_platform_message("banner-id").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));

    let err = db.set_platform_message_active("no-such-id", true).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
