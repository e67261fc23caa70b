//! Named handles to remote maps.

use crate::error::ClientError;
use crate::manager::ConnectionManager;
use std::fmt;

/// Name of the map the load tool writes to unless told otherwise.
pub const DEFAULT_MAP_NAME: &str = "persistent-map";

/// A named reference to one remote map.
///
/// Every call resolves the live session at call time through
/// [`ConnectionManager::with_session`], so a handle outlives reconnects.
#[derive(Clone)]
pub struct MapHandle {
    name: String,
    manager: ConnectionManager,
}

impl fmt::Debug for MapHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapHandle")
            .field("name", &self.name)
            .field("address", &self.manager.address())
            .finish()
    }
}

impl MapHandle {
    pub(crate) fn new(name: &str, manager: ConnectionManager) -> Self {
        Self {
            name: name.to_string(),
            manager,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Store `value` under `key`, returning the value it replaced.
    pub async fn put(&self, key: &str, value: &str) -> Result<Option<String>, ClientError> {
        let name = self.name.as_str();
        self.manager
            .with_session(|session| async move { session.put(name, key, value).await })
            .await
    }

    /// Number of entries in the map at query time.
    pub async fn size(&self) -> Result<u64, ClientError> {
        let name = self.name.as_str();
        self.manager
            .with_session(|session| async move { session.size(name).await })
            .await
    }
}
