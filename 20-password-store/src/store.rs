//! Record store actor.
//!
//! [`StoreActor`] owns the stored hashes, the request counter and the commit
//! timing accumulator. It drains a bounded command queue in arrival order, so
//! every state change happens on one task and no lock is involved.
//! [`StoreHandle`] is the cloneable front door used by everything else.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};
use tracing::debug;

use crate::command::Command;

pub type RecordId = u64;

/// Aggregate statistics reported by the `/stats` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of identifiers reserved so far.
    pub total: u64,
    /// Mean commit time in microseconds, `0` before the first reservation.
    pub average: f64,
}

#[derive(Default)]
struct RecordStore {
    records: HashMap<RecordId, String>,
    total: u64,
    total_elapsed: Duration,
}

impl RecordStore {
    fn read(&self, id: RecordId) -> Option<String> {
        self.records.get(&id).cloned()
    }

    fn reserve(&mut self) -> RecordId {
        self.total += 1;
        self.total
    }

    fn commit(&mut self, id: RecordId, value: String, elapsed: Duration) {
        self.records.insert(id, value);
        self.total_elapsed += elapsed;
    }

    fn stats(&self) -> Stats {
        let average = if self.total == 0 {
            0.0
        } else {
            self.total_elapsed.as_nanos() as f64 / 1_000.0 / self.total as f64
        };
        Stats {
            total: self.total,
            average,
        }
    }
}

/// The single consumer of the command queue.
pub struct StoreActor {
    store: RecordStore,
    commands: mpsc::Receiver<Command>,
}

impl StoreActor {
    /// Serves commands until every [`StoreHandle`] has been dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        debug!("command queue closed, record store stopping");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::ReadValue { id, respond_to } => {
                let _ = respond_to.send(self.store.read(id));
            }
            Command::ReserveIdentifier { respond_to } => {
                let id = self.store.reserve();
                debug!(id, "reserved identifier");
                let _ = respond_to.send(id);
            }
            Command::CommitValue { id, value, started } => {
                let elapsed = started.elapsed();
                self.store.commit(id, value, elapsed);
                debug!(id, elapsed_us = elapsed.as_micros() as u64, "committed hash");
            }
            Command::ReadStats { respond_to } => {
                let _ = respond_to.send(self.store.stats());
            }
        }
    }
}

/// Creates a store without starting it.
///
/// Commands sent through the handle queue up until [`StoreActor::run`] is
/// polled. Panics if `capacity` is zero.
pub fn channel(capacity: usize) -> (StoreHandle, StoreActor) {
    let (commands_tx, commands_rx) = mpsc::channel(capacity);
    let handle = StoreHandle {
        commands: commands_tx,
        outstanding: Arc::new(AtomicUsize::new(0)),
    };
    let actor = StoreActor {
        store: RecordStore::default(),
        commands: commands_rx,
    };
    (handle, actor)
}

/// Creates a store and runs its actor on the current tokio runtime.
pub fn spawn(capacity: usize) -> StoreHandle {
    let (handle, actor) = channel(capacity);
    tokio::spawn(actor.run());
    handle
}

/// Sends commands to the store actor and waits for its replies.
///
/// Cloning is cheap; every clone feeds the same queue. When the queue is full,
/// the methods below wait for space.
#[derive(Clone)]
pub struct StoreHandle {
    commands: mpsc::Sender<Command>,
    outstanding: Arc<AtomicUsize>,
}

impl StoreHandle {
    /// Returns the committed hash for `id`, or `None` when it was never
    /// reserved or its commit has not landed yet.
    pub async fn read_value(&self, id: RecordId) -> Result<Option<String>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.commands
            .send(Command::ReadValue {
                id,
                respond_to: resp_tx,
            })
            .await
            .context("failed to send read request")?;
        resp_rx.await.context("read response channel closed")
    }

    /// Allocates the next identifier and bumps the request count.
    pub async fn reserve(&self) -> Result<RecordId> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.commands
            .send(Command::ReserveIdentifier {
                respond_to: resp_tx,
            })
            .await
            .context("failed to send reserve request")?;
        resp_rx.await.context("reserve response channel closed")
    }

    pub async fn read_stats(&self) -> Result<Stats> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.commands
            .send(Command::ReadStats {
                respond_to: resp_tx,
            })
            .await
            .context("failed to send stats request")?;
        resp_rx.await.context("stats response channel closed")
    }

    pub(crate) async fn commit(&self, id: RecordId, value: String, started: Instant) -> Result<()> {
        self.commands
            .send(Command::CommitValue { id, value, started })
            .await
            .context("failed to send commit")
    }

    /// Commands currently waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.commands.max_capacity() - self.commands.capacity()
    }

    /// Delayed commits scheduled but not yet handed to the queue.
    pub fn outstanding_commits(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub(crate) fn track_commit(&self) -> PendingCommit {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        PendingCommit {
            outstanding: Arc::clone(&self.outstanding),
        }
    }
}

/// Counts one delayed commit as outstanding until dropped.
pub(crate) struct PendingCommit {
    outstanding: Arc<AtomicUsize>,
}

impl Drop for PendingCommit {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}
