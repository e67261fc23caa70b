//! Trait definitions for the remote map RPC capability.

use crate::error::TransportError;
use std::sync::Arc;

/// One established connection to a map cluster.
///
/// Implementations are shared behind an `Arc` by every handle of the same
/// session generation, so they must tolerate concurrent callers.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Store `value` under `key` in `map`, returning the previous value.
    async fn put(&self, map: &str, key: &str, value: &str)
        -> Result<Option<String>, TransportError>;

    /// Count the entries currently held by `map`.
    async fn size(&self, map: &str) -> Result<u64, TransportError>;

    /// Cheap liveness probe used by the health check.
    async fn ping(&self) -> Result<(), TransportError>;
}

/// Opens new connections to a cluster address.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &str) -> Result<Arc<dyn Transport>, TransportError>;
}
