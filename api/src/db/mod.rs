//! SQLite persistence.
//!
//! Mutations open a transaction and commit it on success; returning early
//! drops the transaction, which rolls it back. A transaction that writes does
//! so in its first statement: SQLite will not wait for the write lock when a
//! transaction that has already read tries to upgrade, it fails with
//! `SQLITE_BUSY` instead. Reads used only for friendlier errors run outside
//! the transaction.

pub mod posts;
pub mod users;
pub mod votes;

use std::{str::FromStr, time::Duration};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// How long a statement waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!("database migrations applied");

    Ok(pool)
}

/// Single-connection in-memory database; every connection would otherwise
/// see its own empty schema.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    connect("sqlite::memory:", 1).await
}
