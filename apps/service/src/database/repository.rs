use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Row, params};

use super::error::{Error, Result, map_constraint};
use super::models::{ProbeResult, Resource, i64_to_timestamp, timestamp_to_i64};
use crate::monitoring::types::{ProbeOutcome, ResourceId, ResourceState};
use crate::pool::{LibsqlManager, LibsqlPool};

const RESOURCE_COLUMNS: &str = "id, url, state, created_at, updated_at";
const RESULT_COLUMNS: &str = "id, resource_id, status_code, response_time, created_at, updated_at";

/// Persistence operations the monitoring core relies on.
///
/// Each call is atomic and durable once it returns; there is no separate
/// commit step.
#[async_trait]
pub trait Database: Send + Sync {
    /// All resources, oldest first
    async fn get_all(&self) -> Result<Vec<Resource>>;

    /// A resource by id, or [`Error::NotFound`]
    async fn get_one(&self, id: ResourceId) -> Result<Resource>;

    /// Register `url` with state `Up` unless it is already registered.
    /// Returns whether a row was created alongside the stored resource.
    async fn get_one_or_insert(&self, url: &str) -> Result<(bool, Resource)>;

    /// Persist a new state and bump `updated_at`
    async fn update_state(&self, id: ResourceId, state: ResourceState) -> Result<()>;

    /// Delete a resource after deleting its probe history
    async fn delete(&self, id: ResourceId) -> Result<()>;

    /// Append one history row; [`Error::NotFound`] if the resource is gone
    async fn append_history(&self, outcome: &ProbeOutcome) -> Result<i64>;

    /// History rows, optionally for one resource, oldest first
    async fn list_history(&self, resource_id: Option<ResourceId>) -> Result<Vec<ProbeResult>>;

    /// Bulk-delete history rows created at or before `cutoff`
    async fn delete_history_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// LibSQL database implementation
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

impl DatabaseImpl {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

fn resource_from_row(row: &Row) -> Result<Resource> {
    let state: String = row.get(2)?;
    Ok(Resource {
        id: row.get(0)?,
        url: row.get(1)?,
        state: state.parse().map_err(Error::Decode)?,
        created_at: i64_to_timestamp(row.get(3)?),
        updated_at: i64_to_timestamp(row.get(4)?),
    })
}

fn result_from_row(row: &Row) -> Result<ProbeResult> {
    let status_code: i64 = row.get(2)?;
    Ok(ProbeResult {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        status_code: u16::try_from(status_code)
            .map_err(|_| Error::Decode(format!("status code {status_code} out of range")))?,
        response_time: row.get(3)?,
        created_at: i64_to_timestamp(row.get(4)?),
        updated_at: i64_to_timestamp(row.get(5)?),
    })
}

#[async_trait]
impl Database for DatabaseImpl {
    async fn get_all(&self) -> Result<Vec<Resource>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY id"), ())
            .await?;

        let mut resources = Vec::new();
        while let Some(row) = rows.next().await? {
            resources.push(resource_from_row(&row)?);
        }
        Ok(resources)
    }

    async fn get_one(&self, id: ResourceId) -> Result<Resource> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?"), params![id])
            .await?;

        match rows.next().await? {
            Some(row) => resource_from_row(&row),
            None => Err(Error::NotFound),
        }
    }

    async fn get_one_or_insert(&self, url: &str) -> Result<(bool, Resource)> {
        let conn = self.get_conn().await?;
        let now = timestamp_to_i64(Utc::now());

        let inserted = conn
            .execute(
                "INSERT INTO resources (url, state, created_at, updated_at) VALUES (?, ?, ?, ?) \
                 ON CONFLICT(url) DO NOTHING",
                params![url, ResourceState::Up.as_str(), now, now],
            )
            .await?;

        let mut rows = conn
            .query(&format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE url = ?"), params![url])
            .await?;
        let resource = match rows.next().await? {
            Some(row) => resource_from_row(&row)?,
            None => return Err(Error::NotFound),
        };

        Ok((inserted == 1, resource))
    }

    async fn update_state(&self, id: ResourceId, state: ResourceState) -> Result<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE resources SET state = ?, updated_at = ? WHERE id = ?",
                params![state.as_str(), timestamp_to_i64(Utc::now()), id],
            )
            .await?;

        if updated == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: ResourceId) -> Result<()> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        tx.execute("DELETE FROM probe_results WHERE resource_id = ?", params![id]).await?;
        let deleted = tx.execute("DELETE FROM resources WHERE id = ?", params![id]).await?;

        if deleted == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append_history(&self, outcome: &ProbeOutcome) -> Result<i64> {
        let conn = self.get_conn().await?;
        let at = timestamp_to_i64(outcome.observed_at);

        conn.execute(
            "INSERT INTO probe_results (resource_id, status_code, response_time, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
            params![outcome.resource_id, outcome.status_code as i64, outcome.response_time, at, at],
        )
        .await
        .map_err(map_constraint)?;

        Ok(conn.last_insert_rowid())
    }

    async fn list_history(&self, resource_id: Option<ResourceId>) -> Result<Vec<ProbeResult>> {
        let conn = self.get_conn().await?;
        let mut rows = match resource_id {
            Some(id) => {
                conn.query(
                    &format!("SELECT {RESULT_COLUMNS} FROM probe_results WHERE resource_id = ? ORDER BY id"),
                    params![id],
                )
                .await?
            }
            None => {
                conn.query(&format!("SELECT {RESULT_COLUMNS} FROM probe_results ORDER BY id"), ())
                    .await?
            }
        };

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(result_from_row(&row)?);
        }
        Ok(results)
    }

    async fn delete_history_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM probe_results WHERE created_at <= ?",
                params![timestamp_to_i64(cutoff)],
            )
            .await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;
    use chrono::Duration;

    #[tokio::test]
    async fn insert_is_idempotent_per_url() {
        let (db, _dir) = test_database().await;

        let (created, first) = db.get_one_or_insert("https://example.com").await.unwrap();
        assert!(created);
        assert_eq!(first.state, ResourceState::Up);

        let (created, second) = db.get_one_or_insert("https://example.com").await.unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(db.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let (db, _dir) = test_database().await;

        let (_, a) = db.get_one_or_insert("https://a.example").await.unwrap();
        db.delete(a.id).await.unwrap();
        let (_, b) = db.get_one_or_insert("https://b.example").await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let (db, _dir) = test_database().await;

        assert!(matches!(db.get_one(42).await, Err(Error::NotFound)));
        assert!(matches!(db.update_state(42, ResourceState::Down).await, Err(Error::NotFound)));
        assert!(matches!(db.delete(42).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn update_state_bumps_updated_at() {
        let (db, _dir) = test_database().await;
        let (_, resource) = db.get_one_or_insert("https://example.com").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        db.update_state(resource.id, ResourceState::Down).await.unwrap();

        let updated = db.get_one(resource.id).await.unwrap();
        assert_eq!(updated.state, ResourceState::Down);
        assert!(updated.updated_at > resource.updated_at);
        assert_eq!(updated.created_at, resource.created_at);
    }

    #[tokio::test]
    async fn history_requires_an_existing_resource() {
        let (db, _dir) = test_database().await;

        let orphan = ProbeOutcome::new(99, 200, 0.1);
        assert!(matches!(db.append_history(&orphan).await, Err(Error::NotFound)));
        assert!(db.list_history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_history_first() {
        let (db, _dir) = test_database().await;
        let (_, keep) = db.get_one_or_insert("https://keep.example").await.unwrap();
        let (_, gone) = db.get_one_or_insert("https://gone.example").await.unwrap();

        db.append_history(&ProbeOutcome::new(keep.id, 200, 0.1)).await.unwrap();
        db.append_history(&ProbeOutcome::new(gone.id, 200, 0.1)).await.unwrap();
        db.append_history(&ProbeOutcome::new(gone.id, 500, 0.2)).await.unwrap();

        db.delete(gone.id).await.unwrap();

        let history = db.list_history(None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].resource_id, keep.id);
        assert!(matches!(db.get_one(gone.id).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn delete_older_than_uses_inclusive_cutoff() {
        let (db, _dir) = test_database().await;
        let (_, resource) = db.get_one_or_insert("https://example.com").await.unwrap();
        let cutoff = i64_to_timestamp(timestamp_to_i64(Utc::now() - Duration::hours(2)));

        let at_cutoff = ProbeOutcome::new(resource.id, 200, 0.1).observed_at(cutoff);
        let before = ProbeOutcome::new(resource.id, 200, 0.1).observed_at(cutoff - Duration::hours(1));
        let after = ProbeOutcome::new(resource.id, 200, 0.1).observed_at(cutoff + Duration::milliseconds(1));
        for outcome in [&at_cutoff, &before, &after] {
            db.append_history(outcome).await.unwrap();
        }

        assert_eq!(db.delete_history_older_than(cutoff).await.unwrap(), 2);

        let remaining = db.list_history(Some(resource.id)).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].created_at, after.observed_at);
        assert_eq!(db.delete_history_older_than(cutoff).await.unwrap(), 0);
    }
}
