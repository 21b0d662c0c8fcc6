// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod event_stream;
pub mod http_repository;
pub mod sse_transport;
pub mod ws_transport;

use crate::application::live_transport::{LiveTransport, TransportKind};
use crate::error::Result;
use self::config::DashboardConfig;
use self::sse_transport::SseTransport;
use std::sync::Arc;
use self::ws_transport::WsTransport;

/// Pick the live transport named in the configuration
pub fn live_transport(config: &DashboardConfig) -> Result<Arc<dyn LiveTransport>> {
    let transport: Arc<dyn LiveTransport> = match config.live.transport {
        TransportKind::Sse => Arc::new(SseTransport::new(&config.api)?),
        TransportKind::Websocket => Arc::new(WsTransport::new(&config.api)?),
    };
    tracing::debug!("Using {} for live updates", transport.kind());
    Ok(transport)
}
