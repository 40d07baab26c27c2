//! Resource health monitoring core.
//!
//! Tracks registered URLs, probes them on a schedule, keeps an UP/DOWN state
//! per resource with 403-tolerant hysteresis and prunes old probe history.

pub mod config;
pub mod database;
pub mod error;
pub mod monitoring;
pub mod orchestrator;
pub mod pool;
pub mod resources;
pub mod validation;

pub use config::Config;
pub use error::ResourceError;
pub use orchestrator::Orchestrator;
pub use resources::ResourceService;
