// Transport seam for live sensor updates
use crate::error::DashboardError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Server-Sent Events on `/sensor/{id}/live`
    Sse,
    /// WebSocket on `/sensor/{id}/ws`
    #[serde(alias = "ws")]
    Websocket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Sse => write!(f, "sse"),
            TransportKind::Websocket => write!(f, "websocket"),
        }
    }
}

/// Something the transport reports while a connection is alive
#[derive(Debug)]
pub enum TransportEvent {
    /// The server acknowledged the connection
    Opened,
    /// One raw message payload
    Frame(String),
    Error(DashboardError),
}

/// A single streaming connection for one sensor.
///
/// The connection is created in a not-yet-connected state; the first call to
/// `next_event` performs the handshake and reports `Opened` (or `Error`).
/// `None` means the server ended the stream.
#[async_trait]
pub trait LiveConnection: Send {
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Release the underlying resource. Callers invoke this at most once.
    async fn close(&mut self);
}

/// Factory for live connections, one implementation per wire transport
pub trait LiveTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    fn connect(&self, sensor_id: &str) -> Box<dyn LiveConnection>;
}
