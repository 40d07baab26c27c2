/// Monitoring engine - probes resources and keeps their UP/DOWN state
///
/// This module is responsible for:
/// - Executing timed HTTP probes through a pluggable transport
/// - Classifying statuses and deciding state flips
/// - Fanning checks out across all resources on each cycle
pub mod checker;
pub mod executor;
pub mod policy;
pub mod scheduler;
pub mod types;

pub use checker::{HttpTransport, Prober, Transport, TransportError};
pub use executor::{CheckExecutor, CheckJob, CheckReport, ResourceSnapshot};
pub use policy::{Transition, is_healthy, reconcile};
pub use scheduler::{CheckScheduler, CycleReport, RetryPolicy};
pub use types::{ProbeOutcome, ResourceId, ResourceState};
