// WebSocket transport for live sensor updates
use crate::application::live_transport::{
    LiveConnection, LiveTransport, TransportEvent, TransportKind,
};
use crate::error::{DashboardError, Result};
use crate::infrastructure::config::ApiSettings;
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct WsTransport {
    base_url: String,
    connect_timeout: Duration,
}

impl WsTransport {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        Ok(Self {
            base_url: settings.ws_base()?,
            connect_timeout: settings.timeout(),
        })
    }
}

impl LiveTransport for WsTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Websocket
    }

    fn connect(&self, sensor_id: &str) -> Box<dyn LiveConnection> {
        let url = format!(
            "{}/sensor/{}/ws",
            self.base_url,
            urlencoding::encode(sensor_id)
        );
        Box::new(WsConnection {
            url,
            connect_timeout: self.connect_timeout,
            socket: None,
            started: false,
            closed: false,
        })
    }
}

struct WsConnection {
    url: String,
    connect_timeout: Duration,
    socket: Option<Socket>,
    started: bool,
    closed: bool,
}

impl WsConnection {
    async fn open(&mut self) -> Result<()> {
        tracing::debug!("Connecting to {}", self.url);
        let (socket, _) = timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| DashboardError::Transport(format!("Connecting to {} timed out", self.url)))?
            .map_err(|e| DashboardError::Transport(format!("Connecting to {} failed: {}", self.url, e)))?;

        self.socket = Some(socket);
        Ok(())
    }
}

#[async_trait]
impl LiveConnection for WsConnection {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.closed {
            return None;
        }

        if !self.started {
            self.started = true;
            return Some(match self.open().await {
                Ok(()) => TransportEvent::Opened,
                Err(e) => TransportEvent::Error(e),
            });
        }

        let socket = self.socket.as_mut()?;
        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return Some(TransportEvent::Frame(text.to_string())),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Some(TransportEvent::Frame(text)),
                    Err(_) => {
                        tracing::warn!("Dropping non UTF-8 binary message from {}", self.url);
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!("{} closed by server: {:?}", self.url, frame);
                    return None;
                }
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Some(TransportEvent::Error(DashboardError::Transport(format!(
                        "Reading from {} failed: {}",
                        self.url, e
                    ))));
                }
                None => return None,
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                tracing::debug!("Closing {} failed: {}", self.url, e);
            }
        }
    }
}
