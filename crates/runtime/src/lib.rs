use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use taskdesk_chats::{ConversationService, Coordinator, CoordinatorConfig, CoordinatorHandle};
use taskdesk_config::{AppConfig, ChatConfig};
use taskdesk_database::{initialize_database, SqliteMessageStore, SqliteParticipantDirectory};
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

pub type SqliteConversationService =
    ConversationService<SqliteMessageStore, SqliteParticipantDirectory>;

/// Everything the server needs, wired against one SQLite pool.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub store: Arc<SqliteMessageStore>,
    pub directory: Arc<SqliteParticipantDirectory>,
    pub conversations: Arc<SqliteConversationService>,
    pub coordinator: CoordinatorHandle,
}

impl BackendServices {
    /// Open the database, apply migrations and start the coordinator task.
    /// Must run inside a tokio runtime.
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let db_pool = initialize_database(&config.database).await?;

        let store = Arc::new(SqliteMessageStore::new(db_pool.clone()));
        let directory = Arc::new(SqliteParticipantDirectory::new(db_pool.clone()));
        let conversations = Arc::new(
            ConversationService::new(Arc::clone(&store), Arc::clone(&directory))
                .with_max_message_length(config.chat.max_message_length),
        );
        let coordinator = Coordinator::spawn(Arc::clone(&store), coordinator_config(&config.chat));

        info!(
            history_limit = config.chat.history_limit,
            max_message_length = config.chat.max_message_length,
            "conversation engine ready"
        );

        Ok(Self {
            db_pool,
            store,
            directory,
            conversations,
            coordinator,
        })
    }
}

pub fn coordinator_config(chat: &ChatConfig) -> CoordinatorConfig {
    CoordinatorConfig {
        history_limit: chat.history_limit,
        max_message_length: chat.max_message_length,
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
