//! Session state and generation-tagged session handles.

use crate::error::{ClientError, TransportError};
use crate::manager::Shared;
use crate::transport::Transport;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of the manager's session slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Generation of the most recently established session; 0 before the
    /// first connect succeeds.
    pub generation: u64,
    /// Reconnect attempt in progress for the current outage, 0 when none.
    pub attempt: u32,
    pub last_error: Option<String>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            generation: 0,
            attempt: 0,
            last_error: None,
        }
    }
}

/// A borrowed view of one session generation.
///
/// Handles are cheap to clone. Once the manager replaces or tears down the
/// generation a handle was issued for, every call on it fails with
/// [`ClientError::SessionInvalidated`], including calls already in flight.
#[derive(Clone)]
pub struct Session {
    generation: u64,
    transport: Arc<dyn Transport>,
    invalidated: CancellationToken,
    shared: Arc<Shared>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        generation: u64,
        transport: Arc<dyn Transport>,
        invalidated: CancellationToken,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            generation,
            transport,
            invalidated,
            shared,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this handle still refers to the live session.
    pub fn is_current(&self) -> bool {
        !self.invalidated.is_cancelled() && self.shared.is_live(self.generation)
    }

    /// Store `value` under `key`, returning the previous value if any.
    pub async fn put(
        &self,
        map: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, ClientError> {
        self.call(|transport| async move { transport.put(map, key, value).await })
            .await
    }

    /// Number of entries in `map` at query time.
    pub async fn size(&self, map: &str) -> Result<u64, ClientError> {
        self.call(|transport| async move { transport.size(map).await })
            .await
    }

    async fn call<T, F, Fut>(&self, op: F) -> Result<T, ClientError>
    where
        F: FnOnce(Arc<dyn Transport>) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        self.ensure_current()?;

        let shutdown = self.shared.shutdown_token();
        let _permit = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Err(ClientError::Cancelled),
            _ = self.invalidated.cancelled() => return Err(self.invalidated_error()),
            permit = self.shared.in_flight().acquire() => {
                permit.map_err(|_| ClientError::Cancelled)?
            }
        };
        self.ensure_current()?;

        let timeout = self.shared.operation_timeout();
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Err(ClientError::Cancelled),
            _ = self.invalidated.cancelled() => return Err(self.invalidated_error()),
            result = tokio::time::timeout(timeout, op(Arc::clone(&self.transport))) => result,
        };

        match result {
            Err(_) => Err(ClientError::Timeout(timeout)),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.breaks_session() {
                    self.shared.invalidate(self.generation, &e.to_string());
                }
                Err(ClientError::Operation(e))
            }
        }
    }

    fn ensure_current(&self) -> Result<(), ClientError> {
        if self.shared.shutdown_token().is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if self.is_current() {
            Ok(())
        } else {
            Err(self.invalidated_error())
        }
    }

    fn invalidated_error(&self) -> ClientError {
        ClientError::SessionInvalidated {
            generation: self.generation,
        }
    }
}
