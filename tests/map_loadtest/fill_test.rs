//! Fill mode end to end.

use crate::helpers::{cli, fast_config_file, init_tracing, memory_connector};
use loadtest_generator::EntryGenerator;
use map_client::{MemoryCluster, OperationKind, RecordingReporter, StatusEvent};
use map_loadtest::Outcome;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SEED: u64 = 42;
const WAIT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn test_fill_bounded_run_writes_generated_entries() {
    init_tracing();
    let cluster = MemoryCluster::new();
    let reporter = Arc::new(RecordingReporter::new());
    let config = fast_config_file();
    let path = config.path().to_str().unwrap();

    let outcome = tokio::time::timeout(
        WAIT,
        map_loadtest::run(
            cli(&["fill", "--seed", "42", "--max-entries", "10", "--config", path]),
            memory_connector(&cluster),
            reporter.clone(),
            &CancellationToken::new(),
        ),
    )
    .await
    .expect("fill should finish")
    .unwrap();

    let Outcome::Filled(metrics) = outcome else {
        panic!("expected a fill outcome, got {outcome:?}");
    };
    assert_eq!(metrics.entries_attempted, 10);
    assert_eq!(metrics.entries_stored, 10);
    assert_eq!(metrics.size_queries, 10);

    // Every stored entry is one the seeded generator produced.
    let expected: Vec<_> = EntryGenerator::with_seed(SEED).take(10).collect();
    for entry in &expected {
        assert_eq!(
            cluster.get(map_client::DEFAULT_MAP_NAME, &entry.key).as_deref(),
            Some(entry.value.as_str())
        );
    }

    let sizes = reporter.sizes();
    assert_eq!(sizes.len(), 10);
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]), "sizes never shrink: {sizes:?}");
    assert_eq!(
        *sizes.last().unwrap(),
        cluster.map_len(map_client::DEFAULT_MAP_NAME) as u64
    );
}

#[tokio::test]
async fn test_fill_uses_named_map() {
    let cluster = MemoryCluster::new();
    let config = fast_config_file();
    let path = config.path().to_str().unwrap();

    map_loadtest::run(
        cli(&[
            "fill",
            "--map",
            "scratch",
            "--max-entries",
            "3",
            "--size-every",
            "0",
            "--config",
            path,
        ]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(cluster.map_len("scratch") >= 1);
    assert_eq!(cluster.map_len(map_client::DEFAULT_MAP_NAME), 0);
    // One connect and three puts, no size queries.
    assert_eq!(cluster.calls().requests, 3);
}

#[tokio::test]
async fn test_fill_survives_cluster_restart() {
    init_tracing();
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
                cli(&["fill", "--config", &path]),
                memory_connector(&cluster),
                reporter,
                &cancel,
            )
            .await
        }
    });

    wait_until(|| cluster.map_len(map_client::DEFAULT_MAP_NAME) >= 5).await;
    cluster.drop_connections();
    wait_until(|| {
        reporter.count(|e| matches!(e, StatusEvent::Connected { generation: 2, .. })) == 1
    })
    .await;
    let before = reporter.count(|e| matches!(e, StatusEvent::EntryStored { .. }));
    wait_until(|| reporter.count(|e| matches!(e, StatusEvent::EntryStored { .. })) > before + 5)
        .await;

    cancel.cancel();
    let outcome = tokio::time::timeout(WAIT, run)
        .await
        .expect("fill should stop after cancellation")
        .unwrap()
        .unwrap();

    let Outcome::Filled(metrics) = outcome else {
        panic!("expected a fill outcome, got {outcome:?}");
    };
    // The dropped connection failed at most the one request in flight.
    assert!(metrics.put_failures + metrics.size_failures <= 1);
    assert!(
        reporter.failures(OperationKind::Put) + reporter.failures(OperationKind::Size) <= 1
    );
    assert!(metrics.entries_stored > 5);
}

#[tokio::test]
async fn test_fill_unreachable_cluster_fails_startup() {
    let cluster = MemoryCluster::new();
    cluster.set_reachable(false);
    let config = fast_config_file();
    let path = config.path().to_str().unwrap();

    let err = map_loadtest::run(
        cli(&["fill", "--address", "10.1.2.3:5701", "--config", path]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("Failed to connect to map cluster at 10.1.2.3:5701"));
    assert_eq!(cluster.calls().connects, 2);
    assert_eq!(cluster.calls().requests, 0);
}

#[tokio::test]
async fn test_fill_stops_when_cluster_stays_down() {
    let cluster = MemoryCluster::new();
    let config = fast_config_file();
    let path = config.path().to_str().unwrap().to_string();
    let cancel = CancellationToken::new();

    let run = tokio::spawn({
        let cluster = cluster.clone();
        let cancel = cancel.clone();
        async move {
            map_loadtest::run(
                cli(&["fill", "--config", &path]),
                memory_connector(&cluster),
                Arc::new(RecordingReporter::new()),
                &cancel,
            )
            .await
        }
    });

    wait_until(|| cluster.map_len(map_client::DEFAULT_MAP_NAME) >= 3).await;
    cluster.set_reachable(false);
    cluster.drop_connections();

    let err = tokio::time::timeout(WAIT, run)
        .await
        .expect("fill should give up once the wait budget is spent")
        .unwrap()
        .unwrap_err();
    assert!(format!("{err:#}").contains("unavailable"), "{err:#}");
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition was not reached in time");
}
