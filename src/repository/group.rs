//! Durable storage for proxy groups
//!
//! The registry is seeded from here at startup; administrative mutations
//! write through so a restart reproduces the same registry contents.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::models::{Proxy, ProxyGroup};

/// Repository for proxy group persistence
#[derive(Clone)]
pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load every group with its members, in stored position order
    pub async fn load_all(&self) -> Result<Vec<ProxyGroup>> {
        let group_rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, name FROM proxy_groups ORDER BY position")
                .fetch_all(&self.pool)
                .await?;

        let mut groups = Vec::with_capacity(group_rows.len());
        for (id, name) in group_rows {
            let proxies: Vec<(String, String, String)> = sqlx::query_as(
                "SELECT address, username, password FROM proxies WHERE group_id = ?1 ORDER BY position",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;

            let proxies = proxies
                .into_iter()
                .map(|(address, username, password)| Proxy {
                    address,
                    username,
                    password,
                })
                .collect();

            groups.push(ProxyGroup { id, name, proxies });
        }

        Ok(groups)
    }

    /// Insert or replace a group and its member list.
    ///
    /// Replacement keeps the stored position; a new group appends.
    pub async fn upsert(&self, group: &ProxyGroup) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT position FROM proxy_groups WHERE id = ?1")
                .bind(&group.id)
                .fetch_optional(&mut *tx)
                .await?;

        let position = match existing {
            Some((position,)) => position,
            None => {
                let (next,): (i64,) =
                    sqlx::query_as("SELECT COALESCE(MAX(position), -1) + 1 FROM proxy_groups")
                        .fetch_one(&mut *tx)
                        .await?;
                next
            }
        };

        sqlx::query(
            r#"
            INSERT INTO proxy_groups (id, name, position, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, updated_at = excluded.updated_at
            "#,
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM proxies WHERE group_id = ?1")
            .bind(&group.id)
            .execute(&mut *tx)
            .await?;

        for (index, proxy) in group.proxies.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO proxies (group_id, position, address, username, password)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&group.id)
            .bind(index as i64)
            .bind(&proxy.address)
            .bind(&proxy.username)
            .bind(&proxy.password)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(group = %group.id, members = group.len(), "Persisted proxy group");
        Ok(())
    }

    /// Remove a group and its members; a no-op when absent
    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM proxies WHERE group_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM proxy_groups WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
