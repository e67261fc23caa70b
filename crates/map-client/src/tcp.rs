//! Newline-delimited JSON transport over TCP.
//!
//! Every message is one JSON object on its own line. The client opens with a
//! `hello` carrying the protocol version and credentials, then issues
//! `put` / `size` / `ping` requests, one at a time per connection.
//!
//! ```text
//! > {"op":"hello","protocol":1,"cluster_name":"dev","username":null,"password":null}
//! < {"status":"ok"}
//! > {"op":"put","map":"persistent-map","key":"key-7","value":"value-7"}
//! < {"status":"ok","value":null}
//! > {"op":"size","map":"persistent-map"}
//! < {"status":"ok","value":1}
//! < {"status":"error","kind":"rejected","message":"map is read-only"}
//! ```

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{Connector, Transport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request<'a> {
    Hello {
        protocol: u32,
        cluster_name: &'a str,
        username: Option<&'a str>,
        password: Option<&'a str>,
    },
    Put {
        map: &'a str,
        key: &'a str,
        value: &'a str,
    },
    Size {
        map: &'a str,
    },
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Protocol,
    Rejected,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok {
        #[serde(default)]
        value: serde_json::Value,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl Response {
    fn into_value(self) -> Result<serde_json::Value, TransportError> {
        match self {
            Response::Ok { value } => Ok(value),
            Response::Error { kind, message } => Err(match kind {
                ErrorKind::Auth => TransportError::AuthenticationRejected(message),
                ErrorKind::Protocol => TransportError::ProtocolMismatch(message),
                ErrorKind::Rejected => TransportError::Rejected(message),
            }),
        }
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Set while a request is on the wire. A request future dropped midway
    /// leaves it set, and the stream can no longer be trusted.
    pending: bool,
}

pub struct TcpTransport {
    peer: String,
    conn: Mutex<Connection>,
}

impl TcpTransport {
    async fn request(&self, request: &Request<'_>) -> Result<serde_json::Value, TransportError> {
        let mut line =
            serde_json::to_string(request).map_err(|e| TransportError::Codec(e.to_string()))?;
        line.push('\n');

        let mut conn = self.conn.lock().await;
        if conn.pending {
            return Err(TransportError::ConnectionLost(format!(
                "connection to {} was abandoned mid-request",
                self.peer
            )));
        }
        conn.pending = true;

        conn.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.lost(e))?;
        conn.writer.flush().await.map_err(|e| self.lost(e))?;

        let mut reply = String::new();
        let read = conn
            .reader
            .read_line(&mut reply)
            .await
            .map_err(|e| self.lost(e))?;
        if read == 0 {
            return Err(TransportError::ConnectionLost(format!(
                "{} closed the connection",
                self.peer
            )));
        }
        conn.pending = false;
        drop(conn);

        let response: Response = serde_json::from_str(reply.trim_end())
            .map_err(|e| TransportError::Codec(format!("invalid response {reply:?}: {e}")))?;
        response.into_value()
    }

    fn lost(&self, e: std::io::Error) -> TransportError {
        TransportError::ConnectionLost(format!("{}: {e}", self.peer))
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn put(
        &self,
        map: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, TransportError> {
        match self.request(&Request::Put { map, key, value }).await? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(previous) => Ok(Some(previous)),
            other => Err(TransportError::Codec(format!(
                "expected previous value or null, got {other}"
            ))),
        }
    }

    async fn size(&self, map: &str) -> Result<u64, TransportError> {
        let value = self.request(&Request::Size { map }).await?;
        value
            .as_u64()
            .ok_or_else(|| TransportError::Codec(format!("expected entry count, got {value}")))
    }

    async fn ping(&self) -> Result<(), TransportError> {
        self.request(&Request::Ping).await.map(|_| ())
    }
}

/// Opens [`TcpTransport`]s and performs the handshake.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ClientConfig,
}

impl TcpConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, address: &str) -> Result<Arc<dyn Transport>, TransportError> {
        let stream = tokio::time::timeout(self.config.operation_timeout(), TcpStream::connect(address))
            .await
            .map_err(|_| TransportError::Unreachable {
                address: address.to_string(),
                message: format!("timed out after {:?}", self.config.operation_timeout()),
            })?
            .map_err(|e| TransportError::Unreachable {
                address: address.to_string(),
                message: e.to_string(),
            })?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::ConnectionLost(e.to_string()))?;

        let (read, write) = stream.into_split();
        let transport = TcpTransport {
            peer: address.to_string(),
            conn: Mutex::new(Connection {
                reader: BufReader::new(read),
                writer: write,
                pending: false,
            }),
        };

        let hello = Request::Hello {
            protocol: PROTOCOL_VERSION,
            cluster_name: &self.config.cluster_name,
            username: self.config.username.as_deref(),
            password: self.config.password.as_deref(),
        };
        let handshake =
            tokio::time::timeout(self.config.operation_timeout(), transport.request(&hello))
                .await
                .map_err(|_| {
                    TransportError::ProtocolMismatch(format!("{address} did not answer the handshake"))
                })?;
        match handshake {
            Ok(_) => {}
            // Anything other than a well-formed reply means we are not
            // talking to a map cluster.
            Err(TransportError::Codec(message)) => {
                return Err(TransportError::ProtocolMismatch(message))
            }
            Err(e) => return Err(e),
        }

        debug!("Handshake with {} complete (protocol {})", address, PROTOCOL_VERSION);
        Ok(Arc::new(transport))
    }
}
