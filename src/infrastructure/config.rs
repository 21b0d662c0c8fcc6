use crate::application::live_subscription::ReconnectPolicy;
use crate::application::live_transport::TransportKind;
use crate::error::DashboardError;
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_ALERT_THRESHOLD: f64 = 1000.0;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub api: ApiSettings,
    pub live: LiveSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Socket base; derived from `base_url` when unset
    #[serde(default)]
    pub ws_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveSettings {
    pub transport: TransportKind,
    pub alert_threshold: f64,
    pub reconnect: ReconnectSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectSettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl ApiSettings {
    pub fn http_base(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    /// Base URL for socket traffic. Without an explicit `ws_url` this is the
    /// HTTP base with its scheme switched to `ws`/`wss`.
    pub fn ws_base(&self) -> Result<String, DashboardError> {
        if let Some(ws_url) = self.ws_url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(ws_url.trim_end_matches('/').to_string());
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            DashboardError::Config(format!("invalid api.base_url {:?}: {}", self.base_url, e))
        })?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(DashboardError::Config(format!(
                    "cannot derive a socket URL from scheme {:?}",
                    other
                )));
            }
        };
        url.set_scheme(scheme).map_err(|_| {
            DashboardError::Config(format!("cannot switch {} to {}", self.base_url, scheme))
        })?;

        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl From<&ReconnectSettings> for ReconnectPolicy {
    fn from(settings: &ReconnectSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
        }
    }
}

/// Load settings from built-in defaults, then `config/dashboard.*` (or the
/// given file, which must exist), then `GAS_MONITOR__SECTION__KEY` variables.
pub fn load_dashboard_config(path: Option<&Path>) -> anyhow::Result<DashboardConfig> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config/dashboard").required(false),
    };

    let settings = config::Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.timeout_secs", 10)?
        .set_default("live.transport", "sse")?
        .set_default("live.alert_threshold", DEFAULT_ALERT_THRESHOLD)?
        .set_default("live.reconnect.max_attempts", 0)?
        .set_default("live.reconnect.initial_backoff_ms", 500)?
        .set_default("live.reconnect.max_backoff_ms", 10_000)?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("GAS_MONITOR")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
