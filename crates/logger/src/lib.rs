//! Shared tracing setup for the resmon binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_tracing_with};
