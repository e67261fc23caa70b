//! Size mode end to end.

use crate::helpers::{cli, fast_config_file, memory_connector};
use map_client::{Fault, MemoryCluster, OperationKind, RecordingReporter, StatusEvent};
use map_loadtest::Outcome;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_size_of_empty_map_is_zero() {
    let cluster = MemoryCluster::new();
    let reporter = Arc::new(RecordingReporter::new());

    let outcome = map_loadtest::run(
        cli(&["size"]),
        memory_connector(&cluster),
        reporter.clone(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let Outcome::Size(Some(reading)) = outcome else {
        panic!("expected a size reading, got {outcome:?}");
    };
    assert_eq!(reading.size, 0);
    assert_eq!(reading.map, map_client::DEFAULT_MAP_NAME);
    assert_eq!(reporter.sizes(), vec![0]);
    assert_eq!(cluster.calls().requests, 1);
}

#[tokio::test]
async fn test_size_after_fill_matches_cluster() {
    let cluster = MemoryCluster::new();
    let config = fast_config_file();
    let path = config.path().to_str().unwrap();

    map_loadtest::run(
        cli(&["fill", "--max-entries", "25", "--size-every", "0", "--config", path]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let outcome = map_loadtest::run(
        cli(&["size", "--config", path]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let Outcome::Size(Some(reading)) = outcome else {
        panic!("expected a size reading, got {outcome:?}");
    };
    assert_eq!(reading.size, cluster.map_len(map_client::DEFAULT_MAP_NAME) as u64);
    assert!((1..=25).contains(&reading.size));
}

#[tokio::test]
async fn test_failed_size_query_is_reported_not_fatal() {
    let cluster = MemoryCluster::new();
    cluster.inject(Fault::Reject("partition migrating".to_string()));
    let reporter = Arc::new(RecordingReporter::new());

    let outcome = map_loadtest::run(
        cli(&["size"]),
        memory_connector(&cluster),
        reporter.clone(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Outcome::Size(None)));
    assert_eq!(reporter.failures(OperationKind::Size), 1);
    // One query, no retry.
    assert_eq!(cluster.calls().requests, 1);
}

#[tokio::test]
async fn test_watch_polls_until_cancelled() {
    let cluster = MemoryCluster::new();
    let reporter = Arc::new(RecordingReporter::new());
    let config = fast_config_file();
    let path = config.path().to_str().unwrap().to_string();
    let cancel = CancellationToken::new();

    let run = tokio::spawn({
        let cluster = cluster.clone();
        let reporter = reporter.clone();
        let cancel = cancel.clone();
        async move {
            map_loadtest::run(
                cli(&["size", "--watch", "10ms", "--config", &path]),
                memory_connector(&cluster),
                reporter,
                &cancel,
            )
            .await
        }
    });

    tokio::time::timeout(Duration::from_secs(10), async {
        while reporter.count(|e| matches!(e, StatusEvent::SizeObserved(_))) < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("poller should keep reading");
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("poller should stop after cancellation")
        .unwrap()
        .unwrap();
    let Outcome::Watched(readings) = outcome else {
        panic!("expected a watch outcome, got {outcome:?}");
    };
    assert!(readings >= 3);
}
