//! Bounded job admission.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::error::ScrapeError;

/// Limits on concurrently running jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Jobs allowed to hold a browser at once.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Seconds a job may wait for a free slot before it is rejected.
    #[serde(default = "default_job_queue_timeout")]
    pub job_queue_timeout: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            job_queue_timeout: default_job_queue_timeout(),
        }
    }
}

impl LimitsConfig {
    /// Apply `MAX_CONCURRENT_JOBS` and `JOB_QUEUE_TIMEOUT` overrides.
    /// Unparseable values are ignored.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(n) = lookup("MAX_CONCURRENT_JOBS").and_then(|v| v.parse().ok()) {
            self.max_concurrent_jobs = n;
        }
        if let Some(secs) = lookup("JOB_QUEUE_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.job_queue_timeout = secs;
        }
        self
    }
}

pub fn default_max_concurrent_jobs() -> usize {
    2
}

pub fn default_job_queue_timeout() -> u64 {
    120
}

/// Caps how many jobs drive a browser at the same time.
#[derive(Debug, Clone)]
pub struct Admission {
    slots: Arc<Semaphore>,
    queue_timeout: Duration,
}

impl Admission {
    pub fn new(max_concurrent: usize, queue_timeout: Duration) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
            queue_timeout,
        }
    }

    /// Wait for a free slot. The slot is held until the permit is dropped.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, ScrapeError> {
        let busy = ScrapeError::Busy {
            waited: self.queue_timeout,
        };
        match tokio::time::timeout(self.queue_timeout, self.slots.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            // Closed semaphore; never closed in practice
            Ok(Err(_)) => Err(busy),
            Err(_) => {
                debug!("No job slot freed within {:?}", self.queue_timeout);
                Err(busy)
            }
        }
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

impl From<&LimitsConfig> for Admission {
    fn from(limits: &LimitsConfig) -> Self {
        Self::new(
            limits.max_concurrent_jobs,
            Duration::from_secs(limits.job_queue_timeout),
        )
    }
}
