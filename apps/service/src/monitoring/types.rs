use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a resource by the store.
pub type ResourceId = i64;

/// Status recorded when the connection itself failed (DNS, TCP, TLS) or the
/// probe ran past its timeout. Mirrors `408 Request Timeout`.
pub const CONNECTION_FAILED_STATUS: u16 = 408;

/// Status recorded when the probe failed without a response and without a
/// recognisable connection error. Mirrors `418 I'm a teapot`.
pub const UNCLASSIFIED_FAILURE_STATUS: u16 = 418;

/// Availability state persisted per resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Up,
    Down,
    Unknown,
}

impl ResourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Up => "up",
            ResourceState::Down => "down",
            ResourceState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ResourceState::Up),
            "down" => Ok(ResourceState::Down),
            "unknown" => Ok(ResourceState::Unknown),
            other => Err(format!("unknown resource state '{other}'")),
        }
    }
}

/// Result of one probe against a resource, before it is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Resource the probe was issued for
    pub resource_id: ResourceId,

    /// Observed HTTP status, or one of the failure sentinels
    pub status_code: u16,

    /// Seconds elapsed from send to completion or failure
    pub response_time: f64,

    /// When the probe finished; becomes the history row's `created_at`
    pub observed_at: DateTime<Utc>,
}

impl ProbeOutcome {
    pub fn new(resource_id: ResourceId, status_code: u16, response_time: f64) -> Self {
        Self { resource_id, status_code, response_time, observed_at: Utc::now() }
    }

    /// Override the observation time (backfills, tests)
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_its_column_form() {
        for state in [ResourceState::Up, ResourceState::Down, ResourceState::Unknown] {
            assert_eq!(state.as_str().parse::<ResourceState>(), Ok(state));
        }
        assert!("UP".parse::<ResourceState>().is_err());
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ResourceState::Down).unwrap(), "\"down\"");
    }
}
