//! CLI argument definitions for the map populator.

use clap::Args;
use std::path::PathBuf;

/// Connection and run options shared by the `fill` and `size` modes.
#[derive(Args, Clone, Debug)]
pub struct MapPopulateArgs {
    /// Cluster member address (host:port)
    #[arg(long, env = "MAP_ADDRESS", default_value = "127.0.0.1:5701")]
    pub address: String,

    /// Name of the remote map
    #[arg(long, env = "MAP_NAME", default_value = map_client::DEFAULT_MAP_NAME)]
    pub map: String,

    /// Path to a client configuration TOML file
    #[arg(long, env = "MAP_CLIENT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Random seed for a reproducible entry stream (default: seeded from the OS)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Query the map size after every N stored entries (0 = never)
    #[arg(long, default_value = "1")]
    pub size_every: u32,

    /// Stop filling after this many entries (default: run until interrupted)
    #[arg(long)]
    pub max_entries: Option<u64>,

    /// In size mode, keep polling at this interval (e.g. "5s", "2m", "300")
    #[arg(long, value_name = "DURATION")]
    pub watch: Option<String>,

    /// Validate configuration without contacting the cluster
    #[arg(long)]
    pub dry_run: bool,
}
