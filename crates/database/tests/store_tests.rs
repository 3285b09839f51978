//! SQLite store behaviour against a throwaway database file.

use std::sync::Arc;

use taskdesk_chats::{
    ChatError, ConversationKey, ConversationService, Message, MessageStore, ParticipantDirectory,
    ParticipantKind,
};
use taskdesk_config::DatabaseConfig;
use taskdesk_database::{initialize_database, SqliteMessageStore, SqliteParticipantDirectory, SqlitePool};
use tempfile::TempDir;

const MANAGER: &str = "+15551234567";
const EMPLOYEE: &str = "emp_1700000000_ab12cd34";

struct TestDatabase {
    pool: SqlitePool,
    store: SqliteMessageStore,
    _db_dir: TempDir,
}

impl TestDatabase {
    async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("taskdesk-test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.to_string_lossy()),
            max_connections: 4,
        };

        let pool = initialize_database(&config).await.expect("initialise database");
        Self {
            store: SqliteMessageStore::new(pool.clone()),
            pool,
            _db_dir: db_dir,
        }
    }

    async fn say(&self, from: &str, kind: ParticipantKind, to: &str, body: &str, at: i64) -> Message {
        let key = ConversationKey::derive(from, to).unwrap();
        let message = Message::new(&key, from, kind, to, body).with_timestamp(at);
        self.store.append(&message).await.unwrap();
        message
    }

    async fn seed_directory(&self) {
        sqlx::query("INSERT INTO managers (id, name) VALUES (?, ?)")
            .bind(MANAGER)
            .bind("Morgan")
            .execute(&self.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO employees (id, name, manager_id) VALUES (?, ?, ?)")
            .bind(EMPLOYEE)
            .bind("Ada")
            .bind(MANAGER)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn append_and_list_round_trip() {
    let db = TestDatabase::new().await;
    let first = db.say(MANAGER, ParticipantKind::Manager, EMPLOYEE, "hello", 10).await;
    let second = db.say(EMPLOYEE, ParticipantKind::Employee, MANAGER, "hi back", 20).await;

    let key = ConversationKey::derive(MANAGER, EMPLOYEE).unwrap();
    let listed = db.store.list(key.as_str()).await.unwrap();
    assert_eq!(listed, vec![first, second]);
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let db = TestDatabase::new().await;
    let message = db.say(MANAGER, ParticipantKind::Manager, EMPLOYEE, "once", 1).await;

    let result = db.store.append(&message).await;
    assert!(matches!(result, Err(ChatError::PersistenceFailure { .. })));
}

#[tokio::test]
async fn latest_returns_the_newest_window_ascending_with_stable_ties() {
    let db = TestDatabase::new().await;
    for (body, at) in [("a", 1), ("b", 2), ("c", 2), ("d", 3)] {
        db.say(MANAGER, ParticipantKind::Manager, EMPLOYEE, body, at).await;
    }

    let key = ConversationKey::derive(MANAGER, EMPLOYEE).unwrap();
    let window = db.store.latest(key.as_str(), 3).await.unwrap();
    let bodies: Vec<&str> = window.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["b", "c", "d"]);
}

#[tokio::test]
async fn mark_read_flips_only_the_readers_messages() {
    let db = TestDatabase::new().await;
    db.say(MANAGER, ParticipantKind::Manager, EMPLOYEE, "one", 1).await;
    db.say(MANAGER, ParticipantKind::Manager, EMPLOYEE, "two", 2).await;
    db.say(EMPLOYEE, ParticipantKind::Employee, MANAGER, "three", 3).await;

    let key = ConversationKey::derive(MANAGER, EMPLOYEE).unwrap();
    assert_eq!(db.store.mark_read(key.as_str(), EMPLOYEE).await.unwrap(), 2);
    assert_eq!(db.store.mark_read(key.as_str(), EMPLOYEE).await.unwrap(), 0);

    let flags: Vec<bool> = db
        .store
        .list(key.as_str())
        .await
        .unwrap()
        .iter()
        .map(|m| m.read)
        .collect();
    assert_eq!(flags, vec![true, true, false]);
}

#[tokio::test]
async fn heads_prefilter_by_substring_and_pick_newest() {
    let db = TestDatabase::new().await;
    db.say(MANAGER, ParticipantKind::Manager, "emp_1_a", "old", 1).await;
    db.say("emp_1_a", ParticipantKind::Employee, MANAGER, "new", 5).await;
    db.say(MANAGER, ParticipantKind::Manager, "emp_1_ab", "other", 3).await;
    db.say("+15550000000", ParticipantKind::Manager, "emp_2_c", "unrelated", 9).await;

    let mut heads = db.store.conversation_heads("emp_1_a").await.unwrap();
    heads.sort_by_key(|m| m.timestamp);
    let bodies: Vec<&str> = heads.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["other", "new"]);
}

#[tokio::test]
async fn directory_reads_names_and_manager_assignment() {
    let db = TestDatabase::new().await;
    db.seed_directory().await;
    let directory = SqliteParticipantDirectory::new(db.pool.clone());

    assert_eq!(directory.display_name(MANAGER).await.unwrap().as_deref(), Some("Morgan"));
    assert_eq!(directory.display_name(EMPLOYEE).await.unwrap().as_deref(), Some("Ada"));
    assert_eq!(directory.display_name("emp_0_none").await.unwrap(), None);
    assert_eq!(directory.manager_of(EMPLOYEE).await.unwrap().as_deref(), Some(MANAGER));
    assert_eq!(directory.manager_of("emp_0_none").await.unwrap(), None);
}

#[tokio::test]
async fn service_lists_and_purges_through_sqlite() {
    let db = TestDatabase::new().await;
    db.seed_directory().await;
    let store = Arc::new(db.store.clone());
    let directory = Arc::new(SqliteParticipantDirectory::new(db.pool.clone()));
    let service = ConversationService::new(Arc::clone(&store), directory);

    service.welcome_employee(EMPLOYEE, None).await.unwrap();
    db.say(MANAGER, ParticipantKind::Manager, "emp_1_a", "hey", 1).await;

    let listing = service.list_conversations(EMPLOYEE).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].key, "+15551234567_emp_1700000000_ab12cd34");
    assert_eq!(listing[0].counterpart_display_name, "Morgan");

    let manager_view = service.list_conversations(MANAGER).await.unwrap();
    assert_eq!(manager_view.len(), 2);
    assert_eq!(manager_view[0].counterpart_display_name, "Ada");
    assert_eq!(manager_view[1].counterpart_display_name, "Employee");

    // a separator-bounded prefix of the employee id is someone else
    assert_eq!(service.purge_participant("emp_1700000000").await.unwrap(), 0);
    assert_eq!(service.list_conversations(MANAGER).await.unwrap().len(), 2);

    assert_eq!(service.purge_participant(EMPLOYEE).await.unwrap(), 1);
    assert_eq!(service.list_conversations(MANAGER).await.unwrap().len(), 1);
}
