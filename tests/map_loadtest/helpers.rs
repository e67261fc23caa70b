use clap::Parser;
use map_client::{ClientConfig, Connector, MemoryCluster};
use map_loadtest::Cli;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Parse a command line as the binary would.
pub fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("map-loadtest").chain(args.iter().copied()))
        .expect("command line should parse")
}

/// Connector factory wired to `cluster`.
pub fn memory_connector(
    cluster: &MemoryCluster,
) -> impl FnOnce(&ClientConfig) -> Arc<dyn Connector> {
    let cluster = cluster.clone();
    move |config: &ClientConfig| -> Arc<dyn Connector> { Arc::new(cluster.connector(config)) }
}

/// Client config file with short backoffs so failure paths finish quickly.
pub fn fast_config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "backoff_base_ms = 1").unwrap();
    writeln!(file, "backoff_cap_ms = 5").unwrap();
    writeln!(file, "startup_attempts = 2").unwrap();
    writeln!(file, "max_wait_attempts = 3").unwrap();
    writeln!(file, "health_check_interval_ms = 0").unwrap();
    file
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("map_loadtest=debug,map_client=debug,loadtest_populate_map=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
