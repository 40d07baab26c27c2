/// Persistence for resources and their probe history.
///
/// The monitoring core only sees the [`Database`] trait; [`DatabaseImpl`]
/// backs it with a pooled local LibSQL (SQLite) database.

pub mod error;
pub mod migrations;
pub mod models;
pub mod repository;

pub use error::Error;
pub use models::{ProbeResult, Resource};
pub use repository::{Database, DatabaseImpl};

use anyhow::{Context, Result};

use crate::pool::{self, LibsqlPool};

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}

/// Open the pool at `path` and bring the schema up to date
pub async fn connect(path: &str, max_connections: usize) -> Result<LibsqlPool> {
    let pool = pool::open(path, max_connections)
        .await
        .with_context(|| format!("failed to open database at {path}"))?;

    let conn = pool.get().await.context("failed to acquire a connection for migrations")?;
    initialize_database(&conn).await?;
    drop(conn);

    Ok(pool)
}

#[cfg(test)]
pub(crate) async fn test_database() -> (std::sync::Arc<DatabaseImpl>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let pool = connect(&path.to_string_lossy(), 4).await.unwrap();
    (std::sync::Arc::new(DatabaseImpl::new_from_pool(pool)), dir)
}
