//! Graceful shutdown.
//!
//! [`ShutdownCoordinator::begin`] flips the reject flag, then a background
//! task waits out the grace period and polls until the store queue is empty
//! and no delayed commit is still sleeping. The state only moves forward:
//! `Accepting -> Draining -> Terminated`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::store::StoreHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Accepting,
    Draining,
    Terminated,
}

pub struct ShutdownCoordinator {
    rejecting: AtomicBool,
    state: watch::Sender<ShutdownState>,
    grace_period: Duration,
    poll_interval: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration, poll_interval: Duration) -> Self {
        let (state, _) = watch::channel(ShutdownState::Accepting);
        Self {
            rejecting: AtomicBool::new(false),
            state,
            grace_period,
            poll_interval,
        }
    }

    /// True once shutdown has been requested. Never goes back to false.
    pub fn is_rejecting(&self) -> bool {
        self.rejecting.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    /// Starts rejecting new work and spawns the drain task.
    ///
    /// Returns `false` if shutdown was already under way; the existing drain
    /// keeps running.
    pub fn begin(self: &Arc<Self>, store: StoreHandle) -> bool {
        if self.rejecting.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.state.send_replace(ShutdownState::Draining);
        info!(
            queue_depth = store.queue_depth(),
            outstanding = store.outstanding_commits(),
            "shutdown requested, rejecting new requests"
        );

        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.drain(store).await });
        true
    }

    /// Resolves once the drain has finished.
    pub async fn terminated(&self) {
        let mut state = self.state.subscribe();
        let _ = state
            .wait_for(|state| *state == ShutdownState::Terminated)
            .await;
    }

    async fn drain(&self, store: StoreHandle) {
        tokio::time::sleep(self.grace_period).await;

        loop {
            let depth = store.queue_depth();
            let outstanding = store.outstanding_commits();
            if depth == 0 && outstanding == 0 {
                break;
            }
            info!(depth, outstanding, "waiting for pending requests to finish");
            tokio::time::sleep(self.poll_interval).await;
        }

        // Replies come back in queue order, so this answer means every
        // earlier command has been applied.
        match store.read_stats().await {
            Ok(stats) => info!(
                total = stats.total,
                average_us = stats.average,
                "record store drained"
            ),
            Err(error) => warn!(?error, "record store stopped before the drain finished"),
        }

        self.state.send_replace(ShutdownState::Terminated);
    }
}
