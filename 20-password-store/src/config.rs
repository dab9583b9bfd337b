use std::time::Duration;

use anyhow::{bail, Result};
use tracing::warn;

use crate::cli::Cli;

/// Tunables for the store, the commit pipeline and shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub queue_capacity: usize,
    pub commit_delay: Duration,
    pub grace_period: Duration,
    pub drain_poll_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 200,
            commit_delay: Duration::from_secs(5),
            grace_period: Duration::from_secs(5),
            drain_poll_interval: Duration::from_secs(1),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            bail!("queue capacity must be at least 1");
        }
        if self.drain_poll_interval.is_zero() {
            bail!("drain poll interval must be greater than zero");
        }
        if self.grace_period < self.commit_delay {
            warn!(
                grace_ms = self.grace_period.as_millis() as u64,
                delay_ms = self.commit_delay.as_millis() as u64,
                "grace period is shorter than the commit delay; shutdown will wait on outstanding commits"
            );
        }
        Ok(())
    }
}

impl From<&Cli> for ServiceConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            queue_capacity: cli.queue_capacity,
            commit_delay: Duration::from_millis(cli.commit_delay_ms),
            grace_period: Duration::from_millis(cli.grace_period_ms),
            drain_poll_interval: Duration::from_millis(cli.drain_poll_ms),
        }
    }
}
