/// Orchestrator module - wires the monitoring core together
///
/// The orchestrator is constructed once at startup and owns:
/// - the shared probe client and the store handle
/// - the check scheduler, driven by the check cadence
/// - the retention sweeper, driven by its own cadence
///
/// Nothing here is global; binaries and tests build their own instance.
pub mod retention;


pub use retention::{RetentionPolicy, RetentionSweeper};

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::{Database, DatabaseImpl};
use crate::monitoring::checker::{HttpTransport, Prober, Transport};
use crate::monitoring::scheduler::{CheckScheduler, RetryPolicy};
use crate::monitoring::{CheckExecutor, CycleReport};
use crate::pool::LibsqlPool;
use crate::resources::ResourceService;

/// Cadences for the two timers
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub check_every: Duration,
    pub sweep_every: Duration,
}

/// Main orchestrator for the monitoring service
pub struct Orchestrator {
    database: Arc<dyn Database>,
    prober: Arc<Prober>,
    scheduler: Arc<CheckScheduler>,
    sweeper: Arc<RetentionSweeper>,
    cadence: Cadence,
    task_handles: Vec<JoinHandle<()>>,
}

impl Orchestrator {
    /// Build an orchestrator from configuration over an open pool
    pub fn new(config: &Config, pool: LibsqlPool) -> Result<Self> {
        let database: Arc<dyn Database> = Arc::new(DatabaseImpl::new_from_pool(pool));
        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::new(config.probe.timeout_seconds, &config.probe.user_agent)?);

        Ok(Self::from_parts(
            database,
            transport,
            config.probe.timeout(),
            config.retry.policy(),
            config.retention.policy(),
            Cadence {
                check_every: config.schedule.check_interval(),
                sweep_every: config.schedule.retention_interval(),
            },
        ))
    }

    /// Build an orchestrator from explicit collaborators
    pub fn from_parts(
        database: Arc<dyn Database>,
        transport: Arc<dyn Transport>,
        probe_timeout: Duration,
        retry: RetryPolicy,
        retention: RetentionPolicy,
        cadence: Cadence,
    ) -> Self {
        let prober = Arc::new(Prober::new(transport, probe_timeout));
        let executor = Arc::new(CheckExecutor::new(database.clone(), prober.clone()));
        let scheduler = Arc::new(CheckScheduler::new(executor, database.clone(), retry));
        let sweeper = Arc::new(RetentionSweeper::new(database.clone(), retention));

        Self { database, prober, scheduler, sweeper, cadence, task_handles: Vec::new() }
    }

    /// Resource operations sharing this orchestrator's store and probe client
    pub fn resource_service(&self) -> ResourceService {
        ResourceService::new(self.database.clone(), self.prober.clone())
    }

    /// Run a single check cycle now
    pub async fn check_resources(&self) -> Result<CycleReport> {
        Ok(self.scheduler.run_check_cycle().await?)
    }

    /// Run a single retention sweep now
    pub async fn delete_unrelevant_statuses(&self) -> Result<u64> {
        Ok(self.sweeper.delete_unrelevant_statuses().await?)
    }

    /// Start both timers in the background
    pub fn start(&mut self) {
        info!(
            check_every = ?self.cadence.check_every,
            sweep_every = ?self.cadence.sweep_every,
            "Starting check and retention timers"
        );
        self.task_handles.retain(|handle| !handle.is_finished());
        self.task_handles.push(self.scheduler.clone().start_periodic(self.cadence.check_every));
        self.task_handles.push(self.sweeper.clone().start_periodic(self.cadence.sweep_every));
    }

    /// Stop both timers, cancelling any cycle in flight, and wait for the
    /// tasks to wind down
    pub async fn shutdown(&mut self) {
        for handle in &self.task_handles {
            handle.abort();
        }
        for handle in &mut self.task_handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("Timer task ended abnormally: {}", e);
                }
            }
        }
        info!("Orchestrator stopped");
    }

    /// Run the timers until `signal` resolves
    pub async fn run_until(&mut self, signal: impl Future<Output = ()>) {
        self.start();
        signal.await;
        info!("Shutdown signal received");
        self.shutdown().await;
    }

    pub fn is_running(&self) -> bool {
        self.task_handles.iter().any(|handle| !handle.is_finished())
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for handle in &self.task_handles {
            handle.abort();
        }
    }
}
