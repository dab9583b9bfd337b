use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::info;

use crate::{
    config::ServiceConfig,
    pipeline,
    shutdown::ShutdownCoordinator,
    store::{self, RecordId, Stats, StoreHandle},
};

/// Outcome of a request made while shutdown may be under way.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission<T> {
    Accepted(T),
    Terminating,
}

/// Request-facing operations on the record store.
///
/// Each call checks the reject flag before touching the queue, so nothing
/// reaches the store once shutdown has started.
#[derive(Clone)]
pub struct HashService {
    store: StoreHandle,
    shutdown: Arc<ShutdownCoordinator>,
    commit_delay: Duration,
}

impl HashService {
    pub fn new(store: StoreHandle, shutdown: Arc<ShutdownCoordinator>, commit_delay: Duration) -> Self {
        Self {
            store,
            shutdown,
            commit_delay,
        }
    }

    /// Spawns the store actor and wires up a coordinator from `config`.
    pub fn start(config: &ServiceConfig) -> Self {
        let store = store::spawn(config.queue_capacity);
        let shutdown = Arc::new(ShutdownCoordinator::new(
            config.grace_period,
            config.drain_poll_interval,
        ));
        Self::new(store, shutdown, config.commit_delay)
    }

    /// Reserves an identifier for `password` and schedules its hash.
    ///
    /// Returns as soon as the identifier is known; the hash shows up under it
    /// after the commit delay.
    pub async fn submit(&self, password: String) -> Result<Admission<RecordId>> {
        if self.shutdown.is_rejecting() {
            return Ok(Admission::Terminating);
        }

        let pending = self.store.track_commit();
        let id = self.store.reserve().await?;
        pipeline::schedule_commit(self.store.clone(), pending, id, password, self.commit_delay);
        info!(id, "accepted password");
        Ok(Admission::Accepted(id))
    }

    pub async fn read_value(&self, id: RecordId) -> Result<Admission<Option<String>>> {
        if self.shutdown.is_rejecting() {
            return Ok(Admission::Terminating);
        }
        Ok(Admission::Accepted(self.store.read_value(id).await?))
    }

    pub async fn read_stats(&self) -> Result<Admission<Stats>> {
        if self.shutdown.is_rejecting() {
            return Ok(Admission::Terminating);
        }
        Ok(Admission::Accepted(self.store.read_stats().await?))
    }

    /// Starts the shutdown drain and returns the queue depth seen at the time.
    pub fn shutdown(&self) -> usize {
        let depth = self.store.queue_depth();
        self.shutdown.begin(self.store.clone());
        depth
    }

    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }
}
