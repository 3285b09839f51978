//! Message persistence backed by the `messages` table.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use taskdesk_chats::{ChatResult, Message, MessageStore, ParticipantKind};
use tracing::debug;

use crate::types::{DatabaseError, DatabaseResult};

const MESSAGE_COLUMNS: &str =
    "message_id, conversation_key, sender_id, sender_kind, recipient_id, body, timestamp, read";

/// Message store over a SQLite pool
#[derive(Clone)]
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn decode(row: &SqliteRow) -> DatabaseResult<Message> {
        let sender_kind: String = row.try_get("sender_kind")?;
        let sender_kind = sender_kind
            .parse::<ParticipantKind>()
            .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;

        Ok(Message {
            message_id: row.try_get("message_id")?,
            conversation_key: row.try_get("conversation_key")?,
            sender_id: row.try_get("sender_id")?,
            sender_kind,
            recipient_id: row.try_get("recipient_id")?,
            body: row.try_get("body")?,
            timestamp: row.try_get("timestamp")?,
            read: row.try_get("read")?,
        })
    }

    fn decode_all(rows: &[SqliteRow]) -> DatabaseResult<Vec<Message>> {
        rows.iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn append(&self, message: &Message) -> ChatResult<()> {
        sqlx::query(&format!(
            "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&message.message_id)
        .bind(&message.conversation_key)
        .bind(&message.sender_id)
        .bind(message.sender_kind.as_str())
        .bind(&message.recipient_id)
        .bind(&message.body)
        .bind(message.timestamp)
        .bind(message.read)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        debug!(
            message_id = %message.message_id,
            conversation_key = %message.conversation_key,
            "stored message"
        );
        Ok(())
    }

    async fn latest(&self, conversation_key: &str, limit: usize) -> ChatResult<Vec<Message>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM (
                 SELECT {MESSAGE_COLUMNS}, rowid AS seq FROM messages
                 WHERE conversation_key = ?
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?
             ) ORDER BY timestamp ASC, seq ASC"
        ))
        .bind(conversation_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(Self::decode_all(&rows)?)
    }

    async fn list(&self, conversation_key: &str) -> ChatResult<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_key = ?
             ORDER BY timestamp ASC, rowid ASC"
        ))
        .bind(conversation_key)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(Self::decode_all(&rows)?)
    }

    async fn mark_read(&self, conversation_key: &str, reader_id: &str) -> ChatResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET read = 1
             WHERE conversation_key = ? AND recipient_id = ? AND read = 0",
        )
        .bind(conversation_key)
        .bind(reader_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(result.rows_affected())
    }

    async fn conversation_heads(&self, fragment: &str) -> ChatResult<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages AS m
             WHERE instr(m.conversation_key, ?) > 0
               AND m.rowid = (
                   SELECT latest.rowid FROM messages AS latest
                   WHERE latest.conversation_key = m.conversation_key
                   ORDER BY latest.timestamp DESC, latest.rowid DESC
                   LIMIT 1
               )"
        ))
        .bind(fragment)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(Self::decode_all(&rows)?)
    }

    async fn delete_conversation(&self, conversation_key: &str) -> ChatResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE conversation_key = ?")
            .bind(conversation_key)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(result.rows_affected())
    }
}
