// Live subscription state as seen by views
use super::sensor::SensorEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No sensor identifier supplied
    Idle,
    Connecting,
    Open,
    /// Waiting out a backoff delay before the next connection attempt.
    /// Only reachable when a reconnect policy is enabled.
    Reconnecting { attempt: u32 },
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    pub state: ConnectionState,
    pub last_entry: Option<SensorEntry>,
}

impl LiveSnapshot {
    pub fn idle() -> Self {
        Self {
            state: ConnectionState::Idle,
            last_entry: None,
        }
    }

    /// The connectivity flag
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

impl Default for LiveSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}
