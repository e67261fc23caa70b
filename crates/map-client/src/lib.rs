//! Resilient client driver for a remote distributed key-value map.
//!
//! # Overview
//!
//! ```text
//!            ┌────────────────────┐  Connector::connect  ┌─────────┐
//! MapHandle ─► ConnectionManager  ├──────────────────────► cluster │
//!            │  - session slot    │  Transport::put/size  │         │
//!            │  - reconnect loop  │◄──────────────────────┤         │
//!            │  - health check    │                       └─────────┘
//!            └─────────┬──────────┘
//!                      │ StatusEvent
//!                      ▼
//!               StatusReporter
//! ```
//!
//! The manager holds at most one live session. Each successful (re)connect
//! bumps the session generation; handles to older generations fail with
//! [`ClientError::SessionInvalidated`] instead of silently reaching the new
//! connection.
//!
//! # Example
//!
//! ```ignore
//! use map_client::{ClientConfig, ConnectionManager, TcpConnector, TracingReporter};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ClientConfig::default();
//! let cancel = CancellationToken::new();
//! let manager = ConnectionManager::connect(
//!     "127.0.0.1:5701",
//!     Arc::new(TcpConnector::new(config.clone())),
//!     config,
//!     Arc::new(TracingReporter),
//!     &cancel,
//! )
//! .await?;
//!
//! let map = manager.map("persistent-map");
//! map.put("key-1", "value-1").await?;
//! println!("size: {}", map.size().await?);
//! ```

mod backoff;
mod config;
mod error;
mod manager;
mod map;
pub mod memory;
mod session;
mod status;
pub mod tcp;
mod transport;


pub use backoff::Backoff;
pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use manager::ConnectionManager;
pub use map::{MapHandle, DEFAULT_MAP_NAME};
pub use memory::{Fault, MemoryCluster};
pub use session::{Session, SessionState, SessionStatus};
pub use status::{OperationKind, RecordingReporter, StatusEvent, StatusReporter, TracingReporter};
pub use tcp::TcpConnector;
pub use transport::{Connector, Transport};
