use std::{collections::BTreeSet, time::Duration};

use anyhow::Result;
use futures::future::join_all;
use password_store::{
    config::ServiceConfig,
    pipeline::digest,
    service::{Admission, HashService},
    store,
};

fn fast_config() -> ServiceConfig {
    ServiceConfig {
        commit_delay: Duration::from_millis(20),
        grace_period: Duration::from_millis(50),
        drain_poll_interval: Duration::from_millis(10),
        ..ServiceConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_have_no_gaps_or_duplicates() -> Result<()> {
    let store = store::spawn(16);
    let tasks: Vec<_> = (0..100)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.reserve().await })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for task in tasks {
        assert!(ids.insert(task.await??), "identifier handed out twice");
    }
    assert_eq!(ids, (1..=100).collect::<BTreeSet<u64>>());
    assert_eq!(store.read_stats().await?.total, 100);
    Ok(())
}

#[tokio::test]
async fn full_queue_holds_callers_back() -> Result<()> {
    let (store, actor) = store::channel(1);

    let first = tokio::spawn({
        let store = store.clone();
        async move { store.reserve().await }
    });
    let second = tokio::spawn({
        let store = store.clone();
        async move { store.reserve().await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.queue_depth(), 1);
    assert!(!first.is_finished());
    assert!(!second.is_finished());

    tokio::spawn(actor.run());
    let mut ids = vec![first.await??, second.await??];
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn three_writers_end_to_end() -> Result<()> {
    let service = HashService::start(&fast_config());
    let passwords = ["red", "green", "blue"];

    let results = join_all(passwords.iter().map(|p| service.submit(p.to_string()))).await;
    let mut ids = BTreeSet::new();
    for result in results {
        match result? {
            Admission::Accepted(id) => ids.insert(id),
            Admission::Terminating => panic!("service should accept"),
        };
    }
    assert_eq!(ids, BTreeSet::from([1, 2, 3]));

    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut hashes = BTreeSet::new();
    for id in &ids {
        match service.read_value(*id).await? {
            Admission::Accepted(Some(value)) => {
                assert!(!value.is_empty());
                hashes.insert(value);
            }
            other => panic!("expected hash for {id}, got {other:?}"),
        }
    }
    let expected: BTreeSet<String> = passwords.into_iter().map(digest).collect();
    assert_eq!(hashes, expected);

    match service.read_stats().await? {
        Admission::Accepted(stats) => {
            assert_eq!(stats.total, 3);
            assert!(stats.average > 0.0, "average was {}", stats.average);
        }
        Admission::Terminating => panic!("service should accept"),
    }
    Ok(())
}

#[tokio::test]
async fn shutdown_keeps_commits_accepted_before_the_flag() -> Result<()> {
    let config = ServiceConfig {
        commit_delay: Duration::from_millis(200),
        grace_period: Duration::from_millis(20),
        drain_poll_interval: Duration::from_millis(10),
        ..ServiceConfig::default()
    };
    let service = HashService::start(&config);

    let Admission::Accepted(id) = service.submit("late".into()).await? else {
        panic!("service should accept");
    };
    service.shutdown();
    assert_eq!(service.submit("rejected".into()).await?, Admission::Terminating);

    tokio::time::timeout(Duration::from_secs(5), service.coordinator().terminated()).await?;
    assert_eq!(service.store().outstanding_commits(), 0);
    assert_eq!(service.store().read_value(id).await?, Some(digest("late")));
    assert_eq!(service.store().read_stats().await?.total, 1);
    Ok(())
}
