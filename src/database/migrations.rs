use sqlx::SqlitePool;
use tracing::info;

use crate::error::{Result, StardustError};

/// Run all database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    create_migrations_table(pool).await?;

    for (version, name, sql) in get_migrations() {
        if !is_migration_applied(pool, version).await? {
            info!(version = version, name = name, "Applying migration");

            // SQLite prepares one statement at a time
            for statement in sql.split(';') {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                sqlx::query(statement)
                    .execute(pool)
                    .await
                    .map_err(StardustError::Database)?;
            }

            record_migration(pool, version, name).await?;

            info!(version = version, name = name, "Migration applied successfully");
        }
    }

    Ok(())
}

/// Create the migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(StardustError::Database)?;

    Ok(())
}

/// Check if a migration has been applied
async fn is_migration_applied(pool: &SqlitePool, version: i32) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_one(pool)
            .await
            .map_err(StardustError::Database)?;

    Ok(count > 0)
}

/// Record a migration as applied
async fn record_migration(pool: &SqlitePool, version: i32, name: &str) -> Result<()> {
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)")
        .bind(version)
        .bind(name)
        .execute(pool)
        .await
        .map_err(StardustError::Database)?;

    Ok(())
}

/// Get all migrations in order
fn get_migrations() -> Vec<(i32, &'static str, &'static str)> {
    vec![
        (1, "proxy_groups", MIGRATION_001_PROXY_GROUPS),
        (2, "sessions", MIGRATION_002_SESSIONS),
    ]
}

// Migration 1: durable proxy group registry
const MIGRATION_001_PROXY_GROUPS: &str = r#"
CREATE TABLE IF NOT EXISTS proxy_groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS proxies (
    group_id TEXT NOT NULL REFERENCES proxy_groups(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    address TEXT NOT NULL,
    username TEXT NOT NULL DEFAULT '',
    password TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (group_id, position)
);

CREATE INDEX IF NOT EXISTS idx_proxies_group ON proxies(group_id)
"#;

// Migration 2: session records and their messages
const MIGRATION_002_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    flow TEXT NOT NULL,
    agent TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    content TEXT NOT NULL DEFAULT '',
    thread TEXT NOT NULL DEFAULT '',
    agent TEXT NOT NULL DEFAULT '',
    flow TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id)
"#;
