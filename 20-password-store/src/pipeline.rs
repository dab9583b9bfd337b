//! Delayed hashing and commit of submitted passwords.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha512};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, warn};

use crate::store::{PendingCommit, RecordId, StoreHandle};

/// SHA-512 of `password`, base64 encoded with padding.
pub fn digest(password: &str) -> String {
    let hash = Sha512::digest(password.as_bytes());
    STANDARD.encode(hash)
}

/// Hashes `password` after `delay` and commits it under `id`.
///
/// The returned task is detached by callers; it keeps running after the
/// request that scheduled it has been answered. `pending` keeps the commit
/// counted as outstanding until it has entered the queue.
pub(crate) fn schedule_commit(
    store: StoreHandle,
    pending: PendingCommit,
    id: RecordId,
    password: String,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let started = Instant::now();
        let value = digest(&password);
        if let Err(error) = store.commit(id, value, started).await {
            warn!(id, ?error, "dropping hash commit");
        } else {
            debug!(id, "hash commit queued");
        }
        drop(pending);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store;

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(
            digest("angryMonkey"),
            "ZEHhWB65gUlzdVwtDQArEyx+KVLzp/aTaRaPlBzYRIFj6vjFdqEb0Q5B8zVKCZ0vKbZPZklJz0Fd7su2A+gf7Q=="
        );
        assert_eq!(
            digest(""),
            "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }

    #[test]
    fn digest_is_deterministic_and_distinguishes_inputs() {
        assert_eq!(digest("hunter2"), digest("hunter2"));
        assert_ne!(digest("hunter2"), digest("hunter3"));
    }

    #[tokio::test(start_paused = true)]
    async fn commit_lands_only_after_delay() {
        let store = store::spawn(8);
        let id = store.reserve().await.expect("reserve");
        let pending = store.track_commit();

        let task = schedule_commit(
            store.clone(),
            pending,
            id,
            "angryMonkey".into(),
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(store.read_value(id).await.expect("read"), None);
        assert_eq!(store.outstanding_commits(), 1);

        task.await.expect("commit task");
        assert_eq!(store.outstanding_commits(), 0);
        assert_eq!(
            store.read_value(id).await.expect("read"),
            Some(digest("angryMonkey"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn commits_may_land_out_of_identifier_order() {
        let store = store::spawn(8);
        let slow = store.reserve().await.expect("reserve");
        let fast = store.reserve().await.expect("reserve");

        let slow_task = schedule_commit(
            store.clone(),
            store.track_commit(),
            slow,
            "slow".into(),
            Duration::from_secs(5),
        );
        let fast_task = schedule_commit(
            store.clone(),
            store.track_commit(),
            fast,
            "fast".into(),
            Duration::from_secs(1),
        );

        fast_task.await.expect("fast commit");
        assert_eq!(store.read_value(slow).await.expect("read"), None);
        assert_eq!(
            store.read_value(fast).await.expect("read"),
            Some(digest("fast"))
        );

        slow_task.await.expect("slow commit");
        assert_eq!(
            store.read_value(slow).await.expect("read"),
            Some(digest("slow"))
        );
    }
}
