//! Resource operations exposed to the API layer.

use std::sync::Arc;
use tracing::{info, warn};

use crate::database::{Database, ProbeResult, Resource};
use crate::error::ResourceError;
use crate::monitoring::checker::Prober;
use crate::monitoring::policy::is_healthy;
use crate::validation::{validate_http_endpoint, validate_resource_id};

/// Registry operations over a store and the shared probe client
pub struct ResourceService {
    database: Arc<dyn Database>,
    prober: Arc<Prober>,
}

impl ResourceService {
    pub fn new(database: Arc<dyn Database>, prober: Arc<Prober>) -> Self {
        Self { database, prober }
    }

    /// Register a url after a validation probe.
    ///
    /// Fails with `AlreadyExists` without probing when the url is known. When
    /// the validation probe is unhealthy the new row is removed again and the
    /// call fails with `Unavailable`. The probe result is not persisted.
    pub async fn create_resource(&self, url: &str) -> Result<Resource, ResourceError> {
        let url = validate_http_endpoint(url)?;

        let (created, resource) = self.database.get_one_or_insert(&url).await?;
        if !created {
            return Err(ResourceError::AlreadyExists);
        }

        let outcome = self.prober.probe(resource.id, &resource.url).await;
        if !is_healthy(outcome.status_code) {
            warn!(
                resource_id = resource.id,
                url = %resource.url,
                status_code = outcome.status_code,
                "Validation probe failed, discarding resource"
            );
            self.database.delete(resource.id).await?;
            return Err(ResourceError::Unavailable);
        }

        info!(resource_id = resource.id, url = %resource.url, "Registered resource");
        Ok(resource)
    }

    pub async fn get_resource(&self, resource_id: i64) -> Result<Resource, ResourceError> {
        let id = validate_resource_id(resource_id)?;
        Ok(self.database.get_one(id).await?)
    }

    pub async fn get_resources(&self) -> Result<Vec<Resource>, ResourceError> {
        Ok(self.database.get_all().await?)
    }

    /// Delete a resource together with its probe history
    pub async fn delete_resource(&self, resource_id: i64) -> Result<(), ResourceError> {
        let id = validate_resource_id(resource_id)?;
        self.database.delete(id).await?;
        info!(resource_id = id, "Deleted resource");
        Ok(())
    }

    pub async fn get_statuses_by_resource(
        &self,
        resource_id: i64,
    ) -> Result<Vec<ProbeResult>, ResourceError> {
        let id = validate_resource_id(resource_id)?;
        self.database.get_one(id).await?;
        Ok(self.database.list_history(Some(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseImpl, test_database};
    use crate::monitoring::checker::testing::{MockTransport, Reply};
    use crate::monitoring::types::{ProbeOutcome, ResourceState};
    use std::time::Duration;

    async fn service(reply: Reply) -> (ResourceService, Arc<MockTransport>, Arc<DatabaseImpl>, tempfile::TempDir) {
        let (db, dir) = test_database().await;
        let transport = MockTransport::new(reply);
        let prober = Arc::new(Prober::new(transport.clone(), Duration::from_secs(1)));
        (ResourceService::new(db.clone(), prober), transport, db, dir)
    }

    #[tokio::test]
    async fn creates_up_resource_without_history() {
        let (service, transport, db, _dir) = service(Reply::Status(200)).await;

        let resource = service.create_resource("https://example.com").await.unwrap();
        assert_eq!(resource.state, ResourceState::Up);
        assert_eq!(resource.url, "https://example.com/");
        assert_eq!(transport.calls(), 1);
        assert!(db.list_history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forbidden_counts_as_available() {
        let (service, _transport, _db, _dir) = service(Reply::Status(403)).await;

        let resource = service.create_resource("https://guarded.example").await.unwrap();
        assert_eq!(resource.state, ResourceState::Up);
    }

    #[tokio::test]
    async fn duplicate_url_fails_without_probing() {
        let (service, transport, _db, _dir) = service(Reply::Status(200)).await;
        service.create_resource("https://example.com").await.unwrap();

        let err = service.create_resource("https://example.com/").await.unwrap_err();
        assert!(matches!(err, ResourceError::AlreadyExists));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn unhealthy_validation_probe_rolls_back() {
        let (service, _transport, db, _dir) = service(Reply::Status(500)).await;

        let err = service.create_resource("https://broken.example").await.unwrap_err();
        assert!(matches!(err, ResourceError::Unavailable));
        assert!(db.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_validation_probe_is_unavailable() {
        let (service, _transport, _db, _dir) = service(Reply::ConnectError).await;

        let err = service.create_resource("https://down.example").await.unwrap_err();
        assert!(matches!(err, ResourceError::Unavailable));
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_storage() {
        let (service, transport, db, _dir) = service(Reply::Status(200)).await;

        let err = service.create_resource("ftp://example.com").await.unwrap_err();
        assert!(matches!(err, ResourceError::InvalidUrl(_)));
        assert_eq!(transport.calls(), 0);
        assert!(db.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookups_translate_missing_rows() {
        let (service, _transport, _db, _dir) = service(Reply::Status(200)).await;

        assert!(matches!(service.get_resource(7).await, Err(ResourceError::NotFound)));
        assert!(matches!(service.delete_resource(7).await, Err(ResourceError::NotFound)));
        assert!(matches!(service.get_statuses_by_resource(7).await, Err(ResourceError::NotFound)));
    }

    #[tokio::test]
    async fn oversized_ids_are_out_of_range() {
        let (service, _transport, _db, _dir) = service(Reply::Status(200)).await;
        let id = 1_i64 << 32;

        assert!(matches!(service.get_resource(id).await, Err(ResourceError::OutOfRange)));
        assert!(matches!(service.delete_resource(id).await, Err(ResourceError::OutOfRange)));
        assert!(matches!(service.get_statuses_by_resource(id).await, Err(ResourceError::OutOfRange)));
    }

    #[tokio::test]
    async fn delete_removes_resource_and_history() {
        let (service, _transport, db, _dir) = service(Reply::Status(200)).await;
        let resource = service.create_resource("https://example.com").await.unwrap();
        db.append_history(&ProbeOutcome::new(resource.id, 200, 0.3)).await.unwrap();
        assert_eq!(service.get_statuses_by_resource(resource.id).await.unwrap().len(), 1);

        service.delete_resource(resource.id).await.unwrap();

        assert!(db.list_history(None).await.unwrap().is_empty());
        assert!(matches!(service.get_resource(resource.id).await, Err(ResourceError::NotFound)));
    }

    #[tokio::test]
    async fn lists_all_resources() {
        let (service, _transport, _db, _dir) = service(Reply::Status(204)).await;
        service.create_resource("https://a.example").await.unwrap();
        service.create_resource("https://b.example").await.unwrap();

        let urls: Vec<_> = service.get_resources().await.unwrap().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://a.example/", "https://b.example/"]);
    }
}
