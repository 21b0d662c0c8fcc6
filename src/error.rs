// Error types for fetch and live-update operations

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Host unreachable, connection reset, timeout
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Sensor not found: {0}")]
    NotFound(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
