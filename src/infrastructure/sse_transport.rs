// Server-Sent Events transport for live sensor updates
use crate::application::live_transport::{
    LiveConnection, LiveTransport, TransportEvent, TransportKind,
};
use crate::error::{DashboardError, Result};
use crate::infrastructure::config::ApiSettings;
use crate::infrastructure::event_stream::EventStreamDecoder;
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream};
use futures::StreamExt;
use reqwest::header;

#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    base_url: String,
}

impl SseTransport {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        // No overall timeout: the response body stays open for the life of the subscription
        let client = reqwest::Client::builder()
            .connect_timeout(settings.timeout())
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.http_base(),
        })
    }
}

impl LiveTransport for SseTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Sse
    }

    fn connect(&self, sensor_id: &str) -> Box<dyn LiveConnection> {
        let url = format!(
            "{}/sensor/{}/live",
            self.base_url,
            urlencoding::encode(sensor_id)
        );
        Box::new(SseConnection {
            client: self.client.clone(),
            url,
            frames: None,
            started: false,
            closed: false,
        })
    }
}

struct SseConnection {
    client: reqwest::Client,
    url: String,
    frames: Option<BoxStream<'static, Result<String>>>,
    started: bool,
    closed: bool,
}

impl SseConnection {
    async fn open(&mut self) -> Result<()> {
        tracing::debug!("Opening event stream {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| DashboardError::Transport(format!("GET {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Transport(format!(
                "{} responded with status {}",
                self.url, status
            )));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("text/event-stream") {
            return Err(DashboardError::Transport(format!(
                "{} answered with content type {:?} instead of an event stream",
                self.url, content_type
            )));
        }

        self.frames = Some(event_frames(response).boxed());
        Ok(())
    }
}

/// Decode a streaming response body into event payloads
fn event_frames(response: reqwest::Response) -> impl Stream<Item = Result<String>> + Send {
    async_stream::stream! {
        let mut decoder = EventStreamDecoder::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(chunk) => {
                    for payload in decoder.push(&chunk) {
                        yield Ok(payload);
                    }
                }
                Err(e) => {
                    yield Err(DashboardError::Transport(format!("Event stream read failed: {}", e)));
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl LiveConnection for SseConnection {
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

        let frames = self.frames.as_mut()?;
        match frames.next().await {
            Some(Ok(payload)) => Some(TransportEvent::Frame(payload)),
            Some(Err(e)) => Some(TransportEvent::Error(e)),
            None => None,
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        if self.frames.take().is_some() {
            tracing::debug!("Closed event stream {}", self.url);
        }
    }
}
