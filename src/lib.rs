//! Map Load Tool
//!
//! A command-line driver that exercises a remote distributed key-value map.
//!
//! - `fill` writes random entries (`key-N` / `value-N`) into the map until
//!   interrupted, printing the map size as it grows.
//! - `size` prints the current entry count of the map.
//!
//! Connection handling lives in [`map_client`]: the tool survives cluster
//! restarts by reconnecting in the background while in-flight requests fail
//! and get reported.
//!
//! # CLI Usage
//!
//! ```bash
//! # Fill the default map on a local member
//! map-loadtest fill
//!
//! # Reproducible fill of 10k entries, querying the size every 100 writes
//! map-loadtest fill --address 10.0.0.5:5701 --seed 42 --max-entries 10000 --size-every 100
//!
//! # Print the size once, or every 5 seconds
//! map-loadtest size
//! map-loadtest size --watch 5s
//! ```

pub mod cli;
pub mod config;

pub use cli::{Cli, Mode};

use anyhow::Context;
use loadtest_populate_map::{MapPopulator, PopulateMetrics, SizePoller, SizeReading};
use map_client::{ClientConfig, ConnectionManager, Connector, StatusReporter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What a call to [`run`] did.
#[derive(Debug)]
pub enum Outcome {
    /// The mode argument was missing or unknown; the usage line was printed.
    Usage(&'static str),
    /// Configuration was validated and nothing was contacted.
    DryRun(Mode),
    Filled(PopulateMetrics),
    /// `None` when the single size query failed; the failure was reported.
    Size(Option<SizeReading>),
    /// Number of readings taken while watching.
    Watched(u64),
}

/// Run one invocation of the tool.
///
/// `make_connector` builds the transport factory from the loaded client
/// configuration, so callers pick TCP or an in-process cluster. Usage errors
/// return `Ok` without touching the network; a failed initial connection, an
/// invalid configuration, or a cluster that stays unavailable are errors.
pub async fn run<F>(
    cli: Cli,
    make_connector: F,
    reporter: Arc<dyn StatusReporter>,
    cancel: &CancellationToken,
) -> anyhow::Result<Outcome>
where
    F: FnOnce(&ClientConfig) -> Arc<dyn Connector>,
{
    let mode = match Mode::from_arg(cli.mode.as_deref()) {
        Ok(mode) => mode,
        Err(usage) => {
            println!("{usage}");
            return Ok(Outcome::Usage(usage));
        }
    };
    let args = cli.args;

    let client_config = config::load_client_config(args.config.as_deref())?;
    let watch = args
        .watch
        .as_deref()
        .map(config::parse_duration)
        .transpose()
        .context("Invalid --watch interval")?;
    if watch.is_some() && mode == Mode::Fill {
        warn!("--watch only applies to size mode; ignoring it");
    }

    if args.dry_run {
        info!(
            "Dry-run: would run {} against map '{}' at {} (cluster '{}')",
            mode, args.map, args.address, client_config.cluster_name
        );
        return Ok(Outcome::DryRun(mode));
    }

    let connector = make_connector(&client_config);
    let manager = ConnectionManager::connect(
        &args.address,
        connector,
        client_config,
        reporter.clone(),
        cancel,
    )
    .await
    .with_context(|| format!("Failed to connect to map cluster at {}", args.address))?;

    let map = manager.map(&args.map);
    let outcome = match mode {
        Mode::Fill => {
            let mut populator = MapPopulator::new(map, reporter)
                .with_size_every(args.size_every)
                .with_max_entries(args.max_entries);
            if let Some(seed) = args.seed {
                populator = populator.with_seed(seed);
            }
            populator.run(cancel).await.map(Outcome::Filled)
        }
        Mode::Size => {
            let poller = SizePoller::new(map, reporter);
            match watch {
                Some(interval) => poller.poll(interval, cancel).await.map(Outcome::Watched),
                // A failed one-shot query was already reported; the
                // process still ends normally.
                None => Ok(Outcome::Size(poller.query_once().await.ok())),
            }
        }
    };

    manager.shutdown();
    Ok(outcome?)
}
