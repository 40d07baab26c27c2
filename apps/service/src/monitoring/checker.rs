use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::types::{
    CONNECTION_FAILED_STATUS, ProbeOutcome, ResourceId, UNCLASSIFIED_FAILURE_STATUS,
};

/// Why a GET produced no HTTP response
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS, TCP connect or TLS failure, or the request timed out
    #[error("connection failed: {0}")]
    Connect(String),

    /// Anything else the transport could not classify
    #[error("request failed: {0}")]
    Other(String),
}

/// Minimal HTTP transport used by the probe client.
///
/// Error statuses (4xx/5xx) are returned as `Ok(status)`, only failures to get
/// a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<u16, TransportError>;
}

/// reqwest-backed transport, one client shared by every probe
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout_seconds: u64, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<u16, TransportError> {
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) if e.is_connect() || e.is_timeout() => Err(TransportError::Connect(e.to_string())),
            Err(e) => match e.status() {
                Some(status) => Ok(status.as_u16()),
                None => Err(TransportError::Other(e.to_string())),
            },
        }
    }
}

/// Issues single timed probes and turns every outcome into a status code
pub struct Prober {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `url` once. Never fails: connection problems and timeouts map to
    /// [`CONNECTION_FAILED_STATUS`], anything unclassified to
    /// [`UNCLASSIFIED_FAILURE_STATUS`].
    pub async fn probe(&self, resource_id: ResourceId, url: &str) -> ProbeOutcome {
        let start = Instant::now();

        let status_code = match timeout(self.timeout, self.transport.get(url)).await {
            Ok(Ok(status)) => {
                debug!(resource_id, url, status, "Probe completed");
                status
            }
            Ok(Err(TransportError::Connect(reason))) => {
                warn!(resource_id, url, %reason, "Cannot connect to resource");
                CONNECTION_FAILED_STATUS
            }
            Ok(Err(TransportError::Other(reason))) => {
                error!(resource_id, url, %reason, "Probe failed without a response");
                UNCLASSIFIED_FAILURE_STATUS
            }
            Err(_) => {
                warn!(resource_id, url, timeout = ?self.timeout, "Probe timed out");
                CONNECTION_FAILED_STATUS
            }
        };

        ProbeOutcome::new(resource_id, status_code, start.elapsed().as_secs_f64())
    }
}
