//! In-process map cluster.
//!
//! Behaves like a single-member cluster reachable through the [`Connector`]
//! trait, with knobs for the failures a real cluster produces: refused
//! connects, bad credentials, rejected requests, dropped connections and
//! requests that never answer.

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{Connector, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// A failure applied to the next request that reaches the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Answer with a remote rejection; the connection stays usable.
    Reject(String),
    /// Close every open connection, failing this request with `ConnectionLost`.
    DropConnections,
    /// Never answer.
    Hang,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub connects: u64,
    pub requests: u64,
    pub pings: u64,
}

impl CallCounts {
    pub fn total(&self) -> u64 {
        self.connects + self.requests + self.pings
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    maps: HashMap<String, HashMap<String, String>>,
    /// Bumped whenever connections are dropped; transports opened under an
    /// older epoch are closed.
    epoch: u64,
    unreachable: bool,
    credentials: Option<(String, String)>,
    faults: VecDeque<Fault>,
    calls: CallCounts,
}

/// Shared handle to an in-process cluster. Clones refer to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Require these credentials on every connect.
    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        self.lock().credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// Connector presenting the credentials from `config`.
    pub fn connector(&self, config: &ClientConfig) -> MemoryConnector {
        MemoryConnector {
            cluster: self.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Refuse (or accept again) new connections.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().unreachable = !reachable;
    }

    /// Close every open connection.
    pub fn drop_connections(&self) {
        self.lock().epoch += 1;
    }

    /// Queue a fault for the next request.
    pub fn inject(&self, fault: Fault) {
        self.lock().faults.push_back(fault);
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    pub fn network_calls(&self) -> u64 {
        self.calls().total()
    }

    pub fn map_len(&self, map: &str) -> usize {
        self.lock().maps.get(map).map_or(0, HashMap::len)
    }

    pub fn get(&self, map: &str, key: &str) -> Option<String> {
        self.lock().maps.get(map).and_then(|m| m.get(key).cloned())
    }

    pub fn entries(&self, map: &str) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .lock()
            .maps
            .get(map)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }

    fn open(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<MemoryTransport, TransportError> {
        let mut state = self.lock();
        state.calls.connects += 1;
        if state.unreachable {
            return Err(TransportError::Unreachable {
                address: "memory".to_string(),
                message: "connection refused".to_string(),
            });
        }
        if let Some((user, pass)) = &state.credentials {
            if username != Some(user.as_str()) || password != Some(pass.as_str()) {
                return Err(TransportError::AuthenticationRejected(format!(
                    "invalid credentials for user '{}'",
                    username.unwrap_or_default()
                )));
            }
        }
        Ok(MemoryTransport {
            cluster: self.clone(),
            epoch: state.epoch,
        })
    }

    /// Apply pending faults and the epoch check for one request.
    fn admit(&self, epoch: u64) -> Admission {
        let mut state = self.lock();
        if state.epoch != epoch {
            return Admission::Failed(TransportError::ConnectionLost(
                "connection closed by cluster".to_string(),
            ));
        }
        match state.faults.pop_front() {
            None => Admission::Proceed,
            Some(Fault::Reject(message)) => Admission::Failed(TransportError::Rejected(message)),
            Some(Fault::DropConnections) => {
                state.epoch += 1;
                Admission::Failed(TransportError::ConnectionLost(
                    "connection reset by peer".to_string(),
                ))
            }
            Some(Fault::Hang) => Admission::Hang,
        }
    }
}

enum Admission {
    Proceed,
    Failed(TransportError),
    Hang,
}

#[async_trait::async_trait]
impl Connector for MemoryCluster {
    async fn connect(&self, _address: &str) -> Result<Arc<dyn Transport>, TransportError> {
        Ok(Arc::new(self.open(None, None)?))
    }
}

/// Connector that presents credentials to a [`MemoryCluster`].
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    cluster: MemoryCluster,
    username: Option<String>,
    password: Option<String>,
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _address: &str) -> Result<Arc<dyn Transport>, TransportError> {
        let transport = self
            .cluster
            .open(self.username.as_deref(), self.password.as_deref())?;
        Ok(Arc::new(transport))
    }
}

#[derive(Debug)]
pub struct MemoryTransport {
    cluster: MemoryCluster,
    epoch: u64,
}

impl MemoryTransport {
    async fn request(&self) -> Result<(), TransportError> {
        self.cluster.lock().calls.requests += 1;
        match self.cluster.admit(self.epoch) {
            Admission::Proceed => Ok(()),
            Admission::Failed(e) => Err(e),
            Admission::Hang => std::future::pending().await,
        }
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn put(
        &self,
        map: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, TransportError> {
        self.request().await?;
        Ok(self
            .cluster
            .lock()
            .maps
            .entry(map.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string()))
    }

    async fn size(&self, map: &str) -> Result<u64, TransportError> {
        self.request().await?;
        Ok(self.cluster.map_len(map) as u64)
    }

    async fn ping(&self) -> Result<(), TransportError> {
        let mut state = self.cluster.lock();
        state.calls.pings += 1;
        if state.epoch != self.epoch {
            return Err(TransportError::ConnectionLost(
                "connection closed by cluster".to_string(),
            ));
        }
        Ok(())
    }
}
