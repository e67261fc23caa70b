//! Error types for the map populator and poller.

use map_client::ClientError;
use thiserror::Error;

/// A single size query failed.
#[derive(Error, Debug)]
#[error("size query on map '{map}' failed: {source}")]
pub struct QueryError {
    pub map: String,
    #[source]
    pub source: ClientError,
}

/// Errors that end a populate or poll run.
#[derive(Error, Debug)]
pub enum PopulatorError {
    /// The connection manager gave up waiting for a session.
    #[error("map '{map}' became unavailable: {source}")]
    Unavailable {
        map: String,
        #[source]
        source: ClientError,
    },
}
