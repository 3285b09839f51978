//! TaskDesk Database Crate
//!
//! SQLite persistence for the conversation engine: connection management,
//! embedded migrations, and the message store and participant directory
//! behind the engine's repository traits.

use taskdesk_config::DatabaseConfig;

pub mod connection;
pub mod migrations;
pub mod stores;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;
pub use stores::{SqliteMessageStore, SqliteParticipantDirectory};
pub use types::{DatabaseError, DatabaseResult};

/// Re-export commonly used types for convenience
pub use sqlx::SqlitePool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
