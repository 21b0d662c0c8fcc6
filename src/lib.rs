//! Terminal client for a gas sensor telemetry API: sensor list, live readings
//! over SSE or WebSocket, and reading history.
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use error::{DashboardError, Result};
