use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::executor::{CheckExecutor, CheckJob, CheckReport, ResourceSnapshot};
use crate::database::{self, Database};
use crate::error::ResourceError;

/// Bounded retry with exponential backoff for dispatched checks
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub use_jitter: bool,
    pub use_delay_exponent: bool,
    pub max_delay_exponent: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(10),
            use_jitter: true,
            use_delay_exponent: true,
            max_delay_exponent: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (starting at 1), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if !self.use_delay_exponent {
            return self.delay;
        }
        let exponent = attempt.saturating_sub(1).min(self.max_delay_exponent);
        self.delay.saturating_mul(2u32.saturating_pow(exponent))
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.use_jitter && !base.is_zero() {
            let factor: f64 = rand::thread_rng().gen_range(0.5..1.5);
            base.mul_f64(factor)
        } else {
            base
        }
    }
}

/// Counters for one check cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub dispatched: usize,
    pub succeeded: usize,
    pub flipped: usize,
    pub failed: usize,
}

/// Fans a check out to every tracked resource on each cycle
pub struct CheckScheduler {
    executor: Arc<CheckExecutor>,
    database: Arc<dyn Database>,
    retry: RetryPolicy,
}

impl CheckScheduler {
    pub fn new(executor: Arc<CheckExecutor>, database: Arc<dyn Database>, retry: RetryPolicy) -> Self {
        Self { executor, database, retry }
    }

    /// Enumerate all resources and check each one in its own task.
    ///
    /// Waits for every dispatched task; a failing or panicking task is counted
    /// and logged without affecting the others.
    pub async fn run_check_cycle(&self) -> Result<CycleReport, database::Error> {
        let resources = self.database.get_all().await?;
        if resources.is_empty() {
            info!("There are no resources to check. Skipping...");
            return Ok(CycleReport::default());
        }

        let mut tasks = JoinSet::new();
        for resource in &resources {
            let job = CheckJob::from(ResourceSnapshot::from(resource));
            let executor = self.executor.clone();
            let retry = self.retry.clone();
            tasks.spawn(async move { dispatch(executor, retry, job).await });
        }

        let mut report = CycleReport { dispatched: resources.len(), ..Default::default() };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(check)) => {
                    report.succeeded += 1;
                    if check.transition.is_flip() {
                        report.flipped += 1;
                    }
                }
                Ok(None) => report.failed += 1,
                Err(e) => {
                    error!("Check task aborted: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            dispatched = report.dispatched,
            succeeded = report.succeeded,
            flipped = report.flipped,
            failed = report.failed,
            "Check cycle completed"
        );
        Ok(report)
    }

    /// Run check cycles on a fixed cadence until the handle is aborted
    pub fn start_periodic(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(every);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;

                if let Err(e) = self.run_check_cycle().await {
                    warn!("Check cycle failed: {}", e);
                }
            }
        })
    }
}

/// Run one queued check with retries. `None` means every attempt failed or
/// the job can never succeed (resource gone, state missing).
async fn dispatch(executor: Arc<CheckExecutor>, retry: RetryPolicy, job: CheckJob) -> Option<CheckReport> {
    let resource_id = job.resource_id;
    let mut attempt = 0;
    loop {
        match executor.run_job(job.clone()).await {
            Ok(report) => return Some(report),
            Err(ResourceError::NotFound) => {
                debug!(resource_id, "Resource deleted during check, dropping it");
                return None;
            }
            Err(e @ ResourceError::MissingState) => {
                error!(resource_id, "Check rejected: {}", e);
                return None;
            }
            Err(e) if attempt < retry.max_retries => {
                attempt += 1;
                let delay = retry.delay_for(attempt);
                warn!(resource_id, attempt, ?delay, "Check failed, retrying: {}", e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(resource_id, attempts = attempt + 1, "Check failed: {}", e);
                return None;
            }
        }
    }
}
