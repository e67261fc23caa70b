//! Connection manager: owns the single session slot, the reconnect loop and
//! the background health check.
//!
//! # Session lifecycle
//!
//! ```text
//!  connect()            transport error / failed ping
//! ┌──────────┐ ok ┌───────────┐ ───────────────────► ┌────────────┐
//! │Connecting├───►│ Connected │                      │ Connecting │──┐ backoff
//! └────┬─────┘    └───────────┘ ◄─────────────────── └────────────┘◄─┘ + retry
//!      │ startup attempts        generation += 1            │
//!      ▼ exhausted                                          │ shutdown
//! ┌────────┐                                          ┌────────┐
//! │ Failed │                                          │ Failed │
//! └────────┘                                          └────────┘
//! ```
//!
//! The manager is the only writer of the slot. Readers get a
//! [`SessionStatus`] copy or a generation-tagged [`Session`].

use crate::backoff::Backoff;
use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};
use crate::map::MapHandle;
use crate::session::{Session, SessionState, SessionStatus};
use crate::status::{StatusEvent, StatusReporter};
use crate::transport::{Connector, Transport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, trace, warn};

#[derive(Clone)]
struct LiveSession {
    transport: Arc<dyn Transport>,
    invalidated: CancellationToken,
}

#[derive(Clone, Default)]
struct Slot {
    status: SessionStatus,
    live: Option<LiveSession>,
}

pub(crate) struct Shared {
    address: String,
    connector: Arc<dyn Connector>,
    config: ClientConfig,
    backoff: Backoff,
    reporter: Arc<dyn StatusReporter>,
    slot: watch::Sender<Slot>,
    in_flight: Semaphore,
    shutdown: CancellationToken,
}

impl Shared {
    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn in_flight(&self) -> &Semaphore {
        &self.in_flight
    }

    pub(crate) fn operation_timeout(&self) -> Duration {
        self.config.operation_timeout()
    }

    pub(crate) fn is_live(&self, generation: u64) -> bool {
        let slot = self.slot.borrow();
        slot.status.state == SessionState::Connected && slot.status.generation == generation
    }

    fn live(&self) -> Option<(u64, LiveSession)> {
        let slot = self.slot.borrow();
        match (&slot.status.state, &slot.live) {
            (SessionState::Connected, Some(live)) => Some((slot.status.generation, live.clone())),
            _ => None,
        }
    }

    /// Publish a freshly opened transport as the next generation.
    fn install(&self, transport: Arc<dyn Transport>) -> u64 {
        let invalidated = self.shutdown.child_token();
        let mut generation = 0;
        self.slot.send_modify(|slot| {
            slot.status.generation += 1;
            slot.status.state = SessionState::Connected;
            slot.status.attempt = 0;
            slot.live = Some(LiveSession {
                transport,
                invalidated,
            });
            generation = slot.status.generation;
        });
        self.reporter.report(StatusEvent::Connected {
            address: self.address.clone(),
            generation,
        });
        generation
    }

    /// Tear down `generation` and start reconnecting, unless it has already
    /// been replaced.
    pub(crate) fn invalidate(self: &Arc<Self>, generation: u64, reason: &str) {
        let torn_down = self.slot.send_if_modified(|slot| {
            if slot.status.state != SessionState::Connected || slot.status.generation != generation
            {
                return false;
            }
            if let Some(live) = slot.live.take() {
                live.invalidated.cancel();
            }
            slot.status.state = SessionState::Connecting;
            slot.status.attempt = 0;
            slot.status.last_error = Some(reason.to_string());
            true
        });
        if !torn_down {
            return;
        }

        self.reporter.report(StatusEvent::Disconnecting {
            generation,
            reason: reason.to_string(),
        });

        if self.shutdown.is_cancelled() {
            self.mark_failed();
            return;
        }
        tokio::spawn(Arc::clone(self).reconnect_loop());
    }

    async fn reconnect_loop(self: Arc<Self>) {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let delay = self.backoff.delay(attempt);
            self.slot.send_modify(|slot| slot.status.attempt = attempt);
            self.reporter
                .report(StatusEvent::Reconnecting { attempt, delay });

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            let result = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.connector.connect(&self.address) => result,
            };
            match result {
                Ok(transport) => {
                    let generation = self.install(transport);
                    info!(
                        "Reconnected to {} after {} attempt(s) (generation {})",
                        self.address, attempt, generation
                    );
                    return;
                }
                Err(e) => {
                    debug!("Reconnect attempt {} to {} failed: {}", attempt, self.address, e);
                    self.slot
                        .send_modify(|slot| slot.status.last_error = Some(e.to_string()));
                }
            }
        }
        debug!("Reconnect loop for {} stopped", self.address);
        self.mark_failed();
    }

    fn mark_failed(&self) {
        let mut generation = None;
        self.slot.send_if_modified(|slot| {
            if let Some(live) = slot.live.take() {
                live.invalidated.cancel();
            }
            if slot.status.state == SessionState::Failed {
                return false;
            }
            if slot.status.state == SessionState::Connected {
                generation = Some(slot.status.generation);
            }
            slot.status.state = SessionState::Failed;
            true
        });
        if let Some(generation) = generation {
            self.reporter.report(StatusEvent::Disconnecting {
                generation,
                reason: "connection manager shut down".to_string(),
            });
        }
    }

    async fn health_check(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let Some((generation, live)) = self.live() else {
                continue;
            };

            let timeout = self.config.operation_timeout();
            let result = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = live.invalidated.cancelled() => continue,
                result = tokio::time::timeout(timeout, live.transport.ping()) => result,
            };
            match result {
                Ok(Ok(())) => trace!("Health check ok (generation {})", generation),
                Ok(Err(e)) if e.breaks_session() => {
                    self.invalidate(generation, &format!("health check failed: {e}"))
                }
                Ok(Err(e)) => debug!("Health check returned a non-fatal error: {}", e),
                Err(_) => self.invalidate(
                    generation,
                    &format!("health check timed out after {timeout:?}"),
                ),
            }
        }
        debug!("Health check for {} stopped", self.address);
    }
}

/// Establishes and supervises the session to one map cluster.
///
/// Clones share the same session slot. Dropping the last clone stops the
/// health check and any reconnect loop, as [`shutdown`](Self::shutdown) does.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
    _shutdown_on_drop: Arc<DropGuard>,
}

impl ConnectionManager {
    /// Connect to `address`, trying up to `config.startup_attempts` times.
    ///
    /// Authentication and protocol failures are not retried. The manager's
    /// background tasks stop when `cancel` (or [`shutdown`](Self::shutdown))
    /// fires.
    pub async fn connect(
        address: &str,
        connector: Arc<dyn Connector>,
        config: ClientConfig,
        reporter: Arc<dyn StatusReporter>,
        cancel: &CancellationToken,
    ) -> Result<Self, ClientError> {
        let (slot, _) = watch::channel(Slot {
            status: SessionStatus {
                state: SessionState::Connecting,
                ..Default::default()
            },
            live: None,
        });
        let shared = Arc::new(Shared {
            address: address.to_string(),
            connector,
            backoff: config.backoff(),
            in_flight: Semaphore::new(config.max_in_flight.max(1)),
            config,
            reporter,
            slot,
            shutdown: cancel.child_token(),
        });

        let attempts = shared.config.startup_attempts.max(1);
        let mut last_error = None;
        let mut made = 0;
        for attempt in 1..=attempts {
            made = attempt;
            debug!("Connecting to {} (attempt {}/{})", address, attempt, attempts);
            let result = tokio::select! {
                _ = shared.shutdown.cancelled() => return Err(ClientError::Cancelled),
                result = shared.connector.connect(address) => result,
            };
            match result {
                Ok(transport) => {
                    shared.install(transport);
                    if let Some(interval) = shared.config.health_check_interval() {
                        tokio::spawn(Arc::clone(&shared).health_check(interval));
                    }
                    let guard = shared.shutdown.clone().drop_guard();
                    return Ok(Self {
                        shared,
                        _shutdown_on_drop: Arc::new(guard),
                    });
                }
                Err(e) => {
                    let retryable = is_retryable(&e);
                    shared
                        .slot
                        .send_modify(|slot| slot.status.last_error = Some(e.to_string()));
                    last_error = Some(e);
                    if !retryable || attempt == attempts {
                        break;
                    }
                    let delay = shared.backoff.delay(attempt);
                    warn!(
                        "Failed to connect to '{}' (attempt {}/{}). Retrying in {:?}...",
                        address, attempt, attempts, delay
                    );
                    shared
                        .reporter
                        .report(StatusEvent::Reconnecting { attempt, delay });
                    tokio::select! {
                        _ = shared.shutdown.cancelled() => return Err(ClientError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        shared.mark_failed();
        shared.shutdown.cancel();
        let source = last_error.unwrap_or_else(|| TransportError::Unreachable {
            address: address.to_string(),
            message: "no connection attempt was made".to_string(),
        });
        Err(ClientError::Connection {
            address: address.to_string(),
            attempts: made,
            source,
        })
    }

    pub fn address(&self) -> &str {
        &self.shared.address
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Copy of the current session status.
    pub fn status(&self) -> SessionStatus {
        self.shared.slot.borrow().status.clone()
    }

    /// Handle to the live session, without waiting.
    pub fn try_session(&self) -> Option<Session> {
        self.shared.live().map(|(generation, live)| {
            Session::new(
                generation,
                live.transport,
                live.invalidated,
                Arc::clone(&self.shared),
            )
        })
    }

    /// Handle to the live session, waiting out a reconnect if one is in
    /// progress.
    ///
    /// Fails with `Unavailable` once the outage has used more reconnect
    /// attempts than `max_wait_attempts`, or when the manager has failed.
    pub async fn session(&self) -> Result<Session, ClientError> {
        let mut rx = self.shared.slot.subscribe();
        loop {
            if self.shared.shutdown.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            {
                let slot = rx.borrow_and_update();
                let status = &slot.status;
                match (status.state, &slot.live) {
                    (SessionState::Connected, Some(live)) => {
                        return Ok(Session::new(
                            status.generation,
                            Arc::clone(&live.transport),
                            live.invalidated.clone(),
                            Arc::clone(&self.shared),
                        ));
                    }
                    (SessionState::Failed, _) => {
                        return Err(ClientError::Unavailable {
                            attempts: status.attempt,
                            last_error: status.last_error.clone(),
                        });
                    }
                    _ => {
                        if let Some(budget) = self.shared.config.max_wait_attempts {
                            if status.attempt > budget {
                                return Err(ClientError::Unavailable {
                                    attempts: budget,
                                    last_error: status.last_error.clone(),
                                });
                            }
                        }
                    }
                }
            }

            tokio::select! {
                _ = self.shared.shutdown.cancelled() => return Err(ClientError::Cancelled),
                changed = rx.changed() => changed.map_err(|_| ClientError::Cancelled)?,
            }
        }
    }

    /// Run `f` against the live session, waiting for one if necessary.
    pub async fn with_session<T, F, Fut>(&self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let session = self.session().await?;
        f(session).await
    }

    /// Named handle to one remote map bound to this manager.
    pub fn map(&self, name: &str) -> MapHandle {
        MapHandle::new(name, self.clone())
    }

    /// Drop the live session and start reconnecting.
    pub fn force_reconnect(&self, reason: &str) {
        if let Some((generation, _)) = self.shared.live() {
            self.shared.invalidate(generation, reason);
        }
    }

    /// Stop the health check and any reconnect loop. In-flight and later
    /// operations fail with `Cancelled`.
    pub fn shutdown(&self) {
        info!("Shutting down connection to {}", self.shared.address);
        self.shared.shutdown.cancel();
        self.shared.mark_failed();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }
}

fn is_retryable(e: &TransportError) -> bool {
    matches!(
        e,
        TransportError::Unreachable { .. } | TransportError::ConnectionLost(_)
    )
}
