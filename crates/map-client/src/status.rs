//! Status events and the reporter interface.
//!
//! Reporting is fire-and-forget: `report` is synchronous and must not block
//! the caller on anything slower than a log write.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};

/// Which remote operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Connect,
    Put,
    Size,
    Ping,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Connect => write!(f, "connect"),
            OperationKind::Put => write!(f, "put"),
            OperationKind::Size => write!(f, "size"),
            OperationKind::Ping => write!(f, "ping"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A session generation became live.
    Connected { address: String, generation: u64 },
    /// A session generation was torn down.
    Disconnecting { generation: u64, reason: String },
    /// A reconnect attempt is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// A single operation failed; `detail` carries the cause text.
    OperationFailed { kind: OperationKind, detail: String },
    /// A size query returned.
    SizeObserved(u64),
    /// A put was acknowledged.
    EntryStored { key: String },
}

pub trait StatusReporter: Send + Sync {
    fn report(&self, event: StatusEvent);
}

/// Renders every event as one log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, event: StatusEvent) {
        match event {
            StatusEvent::Connected {
                address,
                generation,
            } => info!("Successful connection to {} (generation {})", address, generation),
            StatusEvent::Disconnecting { generation, reason } => {
                warn!("Disconnecting session generation {}: {}", generation, reason)
            }
            StatusEvent::Reconnecting { attempt, delay } => {
                warn!("Reconnecting (attempt {}) in {:?}", attempt, delay)
            }
            StatusEvent::OperationFailed { kind, detail } => warn!("ERR: {} failed: {}", kind, detail),
            StatusEvent::SizeObserved(size) => info!("Current map size: {}", size),
            StatusEvent::EntryStored { key } => info!("Stored {}", key),
        }
    }
}

/// Keeps every event in memory; used by tests to assert on reports.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&StatusEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    pub fn failures(&self, kind: OperationKind) -> usize {
        self.count(|e| matches!(e, StatusEvent::OperationFailed { kind: k, .. } if *k == kind))
    }

    pub fn sizes(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::SizeObserved(n) => Some(n),
                _ => None,
            })
            .collect()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, event: StatusEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
