//! Session record storage
//!
//! Implements the bootstrap coordinator's `SessionStore` seam over the
//! sessions and messages tables.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::bootstrap::SessionStore;
use crate::error::Result;
use crate::models::ChatMessage;

/// Repository for session persistence
#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check whether a session record exists
    pub async fn exists(&self, session_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE id = ?1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Number of messages stored for a session
    pub async fn message_count(&self, session_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE session_id = ?1")
                .bind(session_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn create_session(
        &self,
        flow: &str,
        agent: &str,
        first_message: Option<&ChatMessage>,
    ) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO sessions (id, flow, agent) VALUES (?1, ?2, ?3)")
            .bind(&session_id)
            .bind(flow)
            .bind(agent)
            .execute(&mut *tx)
            .await?;

        if let Some(message) = first_message {
            let message_id = message
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            sqlx::query(
                r#"
                INSERT INTO messages (id, session_id, content, thread, agent, flow)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&message_id)
            .bind(&session_id)
            .bind(message.content.as_deref().unwrap_or_default())
            .bind(message.thread.as_deref().unwrap_or_default())
            .bind(message.agent.as_deref().unwrap_or_default())
            .bind(message.flow.as_deref().unwrap_or_default())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(session = %session_id, flow = flow, agent = agent, "Created session record");
        Ok(session_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(session = %session_id, "Deleted session record");
        Ok(())
    }
}
