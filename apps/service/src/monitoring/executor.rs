use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::checker::Prober;
use super::policy::{Transition, reconcile};
use super::types::{ProbeOutcome, ResourceId, ResourceState};
use crate::database::{self, Database, Resource};
use crate::error::ResourceError;

/// State of a resource captured when its check was dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub id: ResourceId,
    pub url: String,
    pub state: ResourceState,
}

impl From<&Resource> for ResourceSnapshot {
    fn from(resource: &Resource) -> Self {
        Self { id: resource.id, url: resource.url.clone(), state: resource.state }
    }
}

/// Queued form of a check, as handed to a task queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckJob {
    pub resource_id: ResourceId,
    pub url: String,
    #[serde(default)]
    pub state: Option<ResourceState>,
}

impl CheckJob {
    /// Turn the job into a snapshot; a job without a state is a caller bug
    pub fn into_snapshot(self) -> Result<ResourceSnapshot, ResourceError> {
        let state = self.state.ok_or(ResourceError::MissingState)?;
        Ok(ResourceSnapshot { id: self.resource_id, url: self.url, state })
    }
}

impl From<ResourceSnapshot> for CheckJob {
    fn from(snapshot: ResourceSnapshot) -> Self {
        Self { resource_id: snapshot.id, url: snapshot.url, state: Some(snapshot.state) }
    }
}

/// What one executed check did
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub outcome: ProbeOutcome,
    pub transition: Transition,
    pub history_id: i64,
}

/// Runs probe-and-reconcile for a single resource
pub struct CheckExecutor {
    database: Arc<dyn Database>,
    prober: Arc<Prober>,
}

impl CheckExecutor {
    pub fn new(database: Arc<dyn Database>, prober: Arc<Prober>) -> Self {
        Self { database, prober }
    }

    pub fn prober(&self) -> &Arc<Prober> {
        &self.prober
    }

    /// Probe the resource, flip its state if the policy says so and append a
    /// history row.
    ///
    /// Works from the snapshot state only and never re-reads the resource, so
    /// a duplicate run appends one more row and repeats the same decision.
    pub async fn check_single_resource(
        &self,
        snapshot: &ResourceSnapshot,
    ) -> Result<CheckReport, database::Error> {
        let outcome = self.prober.probe(snapshot.id, &snapshot.url).await;
        let transition = reconcile(snapshot.state, outcome.status_code);

        if transition.is_flip() {
            self.database.update_state(snapshot.id, transition.next).await?;
            info!(
                resource_id = snapshot.id,
                url = %snapshot.url,
                status_code = outcome.status_code,
                "Toggled resource state from {} to {}",
                transition.previous,
                transition.next
            );
        } else {
            debug!(
                resource_id = snapshot.id,
                status_code = outcome.status_code,
                state = %transition.next,
                "Resource state unchanged"
            );
        }

        let history_id = self.database.append_history(&outcome).await?;

        Ok(CheckReport { outcome, transition, history_id })
    }

    /// Run a queued job, rejecting jobs that lack the state snapshot
    pub async fn run_job(&self, job: CheckJob) -> Result<CheckReport, ResourceError> {
        let snapshot = job.into_snapshot()?;
        Ok(self.check_single_resource(&snapshot).await?)
    }
}
