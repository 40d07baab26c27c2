//! Health classification and the UP/DOWN transition rule.
//!
//! Every caller goes through [`is_healthy`]; nothing else in the crate checks
//! status ranges directly.

use super::types::ResourceState;

const FORBIDDEN: u16 = 403;

/// A status is healthy when it is 2xx, or 403: anti-bot walls answer probes
/// with 403 while the site itself is up.
pub fn is_healthy(status_code: u16) -> bool {
    (200..=299).contains(&status_code) || status_code == FORBIDDEN
}

/// Outcome of reconciling a probe against the previous state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: ResourceState,
    pub next: ResourceState,
    pub healthy: bool,
}

impl Transition {
    /// Whether the persisted state has to change
    pub fn is_flip(&self) -> bool {
        self.previous != self.next
    }
}

/// Decide the next state from the snapshot state and the latest status.
///
/// `Unknown` counts as `Up`: only an unhealthy probe moves it to `Down`, and a
/// healthy probe settles it at `Up` so no resource stays `Unknown` once probed.
pub fn reconcile(previous: ResourceState, status_code: u16) -> Transition {
    let healthy = is_healthy(status_code);
    let next = match (previous, healthy) {
        (ResourceState::Up | ResourceState::Unknown, false) => ResourceState::Down,
        (ResourceState::Down | ResourceState::Unknown, true) => ResourceState::Up,
        (state, _) => state,
    };

    Transition { previous, next, healthy }
}
