//! Read-only view of the portal's `managers` and `employees` tables.

use async_trait::async_trait;
use sqlx::SqlitePool;
use taskdesk_chats::{ChatResult, ParticipantDirectory};

use crate::types::DatabaseError;

#[derive(Clone)]
pub struct SqliteParticipantDirectory {
    pool: SqlitePool,
}

impl SqliteParticipantDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantDirectory for SqliteParticipantDirectory {
    async fn display_name(&self, participant_id: &str) -> ChatResult<Option<String>> {
        let name: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM managers WHERE id = ?
             UNION ALL
             SELECT name FROM employees WHERE id = ?
             LIMIT 1",
        )
        .bind(participant_id)
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(name.map(|(name,)| name))
    }

    /// `employees.manager_id` is the only field consulted.
    async fn manager_of(&self, employee_id: &str) -> ChatResult<Option<String>> {
        let manager: Option<(Option<String>,)> =
            sqlx::query_as("SELECT manager_id FROM employees WHERE id = ?")
                .bind(employee_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DatabaseError::from)?;

        Ok(manager.and_then(|(manager_id,)| manager_id))
    }
}
