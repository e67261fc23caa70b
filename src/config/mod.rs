//! Configuration loading for the command-line tool.

mod duration;

pub use duration::parse_duration;

use anyhow::Context;
use map_client::ClientConfig;
use std::path::Path;

/// Load the client configuration from a TOML file, or fall back to the
/// defaults when no path is given. The result is validated either way.
pub fn load_client_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read client config from {path:?}"))?;
            toml::from_str::<ClientConfig>(&content)
                .with_context(|| format!("Failed to parse client config from {path:?}"))?
        }
        None => ClientConfig::default(),
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid client config: {e}"))?;
    Ok(config)
}
