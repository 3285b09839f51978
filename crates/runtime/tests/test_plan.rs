use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use sqlx::Row;
use taskdesk_chats::{ClientEvent, MessageStore, ParticipantKind, ServerEvent};
use taskdesk_config::AppConfig;
use taskdesk_runtime::{self, BackendServices};
use tempfile::TempDir;
use tokio::{
    sync::mpsc,
    time::{sleep, timeout},
};

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = max_connections;
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path), 4);

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'messages'",
    )
    .fetch_one(&services.db_pool)
    .await?;

    assert_eq!("messages", table);
    assert!(!services.coordinator.is_closed());

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_rejects_invalid_chat_settings() -> Result<()> {
    let mut config = build_config("sqlite://:memory:".into(), 1);
    config.chat.history_limit = 0;

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected a zero history limit to be rejected"),
        Err(error) => error,
    };
    let message = format!("{error:#}");
    assert!(
        message.contains("history_limit"),
        "expected validation failure naming the setting, got {message}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn coordinator_persists_through_the_sqlite_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/engine.db");
    let mut config = build_config(sqlite_url(&db_path), 2);
    config.chat.max_message_length = 5;

    let services = initialise(&config).await?;
    let (outbound, mut events) = mpsc::channel(16);
    let channel = services.coordinator.connect(outbound);

    services.coordinator.dispatch(
        channel,
        ClientEvent::JoinRoom {
            participant_id: "+15551234567".into(),
            participant_kind: Some(ParticipantKind::Manager),
            counterpart_id: "emp_1_ab".into(),
        },
    );
    services.coordinator.dispatch(
        channel,
        ClientEvent::SendMessage {
            sender_id: "+15551234567".into(),
            sender_kind: ParticipantKind::Manager,
            recipient_id: "emp_1_ab".into(),
            body: "hello there".into(),
        },
    );

    let delivered = timeout(Duration::from_secs(2), async {
        while let Some(event) = events.recv().await {
            if let ServerEvent::NewMessage { message } = event {
                return Some(message);
            }
        }
        None
    })
    .await?
    .context("expected a new-message event")?;

    assert_eq!(delivered.body, "hello");
    let stored = services.store.list("+15551234567_emp_1_ab").await?;
    assert_eq!(stored, vec![delivered]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_database_creates_sqlite_directory_if_missing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("nested");
    let db_path = db_dir.join("prepared.db");
    let config = build_config(sqlite_url(&db_path), 2);

    assert!(!db_dir.exists());

    let services = initialise(&config).await?;
    assert!(db_dir.exists(), "database directory should be created");
    assert!(db_path.exists(), "sqlite database file should be created");
    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_database_enables_sqlite_foreign_keys() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/foreign_keys.db");
    let config = build_config(sqlite_url(&db_path), 2);

    let services = initialise(&config).await?;

    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(1, enabled, "foreign key enforcement must be enabled");

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn prepare_database_applies_max_connections_setting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/max_conn.db");
    let max_connections = 3;
    let config = build_config(sqlite_url(&db_path), max_connections);

    let services = initialise(&config).await?;
    assert_eq!(
        max_connections,
        services.db_pool.options().get_max_connections()
    );

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn memory_database_leaves_no_file_behind() -> Result<()> {
    let config = build_config("sqlite://:memory:".into(), 4);
    let services = initialise(&config).await?;

    let databases = sqlx::query("PRAGMA database_list")
        .fetch_all(&services.db_pool)
        .await?;
    let main_db = databases
        .into_iter()
        .find(|row| {
            row.try_get::<String, _>("name")
                .map(|name| name == "main")
                .unwrap_or(false)
        })
        .context("expected main in PRAGMA database_list")?;
    let file: String = main_db.try_get("file")?;
    assert!(
        file.is_empty(),
        "in-memory sqlite database should not create filesystem entries"
    );
    assert_eq!(1, services.db_pool.options().get_max_connections());

    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn non_sqlite_urls_do_not_touch_the_filesystem() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let target_dir = temp_dir.path().join("should_not_exist");
    let malformed_url = format!("postgres://{}/ignored.db", target_dir.to_string_lossy());
    let config = build_config(malformed_url, 1);

    assert!(!target_dir.exists());

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected sqlite connection to fail for non-sqlite URL"),
        Err(error) => error,
    };
    assert!(
        !target_dir.exists(),
        "non-sqlite URLs must not create filesystem structures"
    );
    assert!(
        error.to_string().contains("connection error"),
        "expected database connection failure, got {error}"
    );

    Ok(())
}

#[test]
fn telemetry_init_tracing_sets_global_subscriber() {
    taskdesk_runtime::telemetry::init_tracing().expect("first initialisation should succeed");

    let second = taskdesk_runtime::telemetry::init_tracing();
    assert!(
        second.is_err(),
        "initialising telemetry twice should fail with global subscriber already set"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(unix), ignore = "requires Unix signal handling")]
async fn shutdown_signal_completes_on_ctrl_c_notification() -> Result<()> {
    let shutdown_task = tokio::spawn(async { taskdesk_runtime::shutdown_signal().await });

    sleep(Duration::from_millis(50)).await;
    #[cfg(unix)]
    unsafe {
        libc::raise(libc::SIGINT);
    }

    timeout(Duration::from_secs(2), shutdown_task).await??;
    Ok(())
}
