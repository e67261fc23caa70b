//! Argument handling: usage errors, dry runs and configuration failures
//! never reach the cluster.

use crate::helpers::{cli, fast_config_file, memory_connector};
use map_client::{MemoryCluster, RecordingReporter};
use map_loadtest::cli::{MISSING_MODE_USAGE, WRONG_MODE_USAGE};
use map_loadtest::{Mode, Outcome};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_wrong_mode_prints_usage_without_network() {
    let cluster = MemoryCluster::new();
    let reporter = Arc::new(RecordingReporter::new());

    let outcome = map_loadtest::run(
        cli(&["foo"]),
        memory_connector(&cluster),
        reporter.clone(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Outcome::Usage(usage) if usage == WRONG_MODE_USAGE));
    assert_eq!(cluster.network_calls(), 0);
    assert!(reporter.events().is_empty());
}

#[tokio::test]
async fn test_missing_mode_prints_usage_without_network() {
    let cluster = MemoryCluster::new();

    let outcome = map_loadtest::run(
        cli(&[]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Outcome::Usage(usage) if usage == MISSING_MODE_USAGE));
    assert_eq!(cluster.network_calls(), 0);
}

#[tokio::test]
async fn test_usage_wins_over_broken_config() {
    // The mode is checked before the config file is read.
    let outcome = map_loadtest::run(
        cli(&["nope", "--config", "/nonexistent/client.toml"]),
        memory_connector(&MemoryCluster::new()),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Outcome::Usage(_)));
}

#[tokio::test]
async fn test_dry_run_does_not_connect() {
    let cluster = MemoryCluster::new();
    let config = fast_config_file();
    let path = config.path().to_str().unwrap();

    let outcome = map_loadtest::run(
        cli(&["fill", "--dry-run", "--config", path]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Outcome::DryRun(Mode::Fill)));
    assert_eq!(cluster.network_calls(), 0);
}

#[tokio::test]
async fn test_invalid_config_is_an_error() {
    let cluster = MemoryCluster::new();
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "startup_attempts = 0").unwrap();
    let path = config.path().to_str().unwrap();

    let err = map_loadtest::run(
        cli(&["size", "--config", path]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Invalid client config"));
    assert_eq!(cluster.network_calls(), 0);
}

#[tokio::test]
async fn test_invalid_watch_interval_is_an_error() {
    let cluster = MemoryCluster::new();

    let err = map_loadtest::run(
        cli(&["size", "--watch", "soon"]),
        memory_connector(&cluster),
        Arc::new(RecordingReporter::new()),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("--watch"));
    assert_eq!(cluster.network_calls(), 0);
}
