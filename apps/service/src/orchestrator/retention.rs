//! Retention of probe history.
//!
//! History rows older than the retention window are purged in bulk on their
//! own cadence, independent of the check cycle. Resources are never touched.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::database::{self, Database};

/// How long probe history is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub window_hours: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { window_hours: 24 }
    }
}

impl RetentionPolicy {
    /// Rows created at or before this instant are expired
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - ChronoDuration::hours(i64::from(self.window_hours))
    }
}

/// Purges expired probe history
pub struct RetentionSweeper {
    database: Arc<dyn Database>,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(database: Arc<dyn Database>, policy: RetentionPolicy) -> Self {
        Self { database, policy }
    }

    /// Delete history older than the window, returning how many rows went
    pub async fn delete_unrelevant_statuses(&self) -> Result<u64, database::Error> {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep relative to an explicit `now`
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64, database::Error> {
        let cutoff = self.policy.cutoff(now);
        debug!(%cutoff, "Sweeping probe history");

        let deleted = self.database.delete_history_older_than(cutoff).await?;
        if deleted == 0 {
            info!(
                "There are no statuses older than {} hours. Skipping...",
                self.policy.window_hours
            );
        } else {
            info!("Deleted {} statuses older than {} hours", deleted, self.policy.window_hours);
        }

        Ok(deleted)
    }

    /// Start background sweeping on a fixed cadence
    pub fn start_periodic(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                if let Err(e) = self.delete_unrelevant_statuses().await {
                    warn!("Periodic retention sweep failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_policy_defaults() {
        assert_eq!(RetentionPolicy::default().window_hours, 24);
    }

    #[test]
    fn test_cutoff_calculation() {
        let now = Utc::now();
        let policy = RetentionPolicy { window_hours: 6 };
        assert_eq!(now - policy.cutoff(now), ChronoDuration::hours(6));
        assert_eq!(RetentionPolicy { window_hours: 0 }.cutoff(now), now);
    }
}
