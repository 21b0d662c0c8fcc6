// Sensor domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub label: String,
    pub created_at: i64,
}

impl Sensor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            created_at,
        }
    }

    /// Abbreviated id shown on list cards: "3f2a9c1e..."
    pub fn short_id(&self) -> String {
        let prefix: String = self.id.chars().take(8).collect();
        format!("{}...", prefix)
    }

    /// Label for headings, falling back to the id when the label is empty
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    pub fn created_date(&self) -> String {
        format_timestamp(self.created_at, "%Y-%m-%d")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub id: String,
    pub sensor_id: String,
    pub value: f64,
    pub created_at: i64,
}

impl SensorEntry {
    pub fn new(
        id: impl Into<String>,
        sensor_id: impl Into<String>,
        value: f64,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            sensor_id: sensor_id.into(),
            value,
            created_at,
        }
    }

    pub fn created_time(&self) -> String {
        format_timestamp(self.created_at, "%Y-%m-%d %H:%M:%S")
    }
}

/// Sort entries ascending by `created_at`. The sort is stable, so entries
/// sharing a timestamp keep the order the server sent them in.
pub fn sort_entries_by_created_at(mut entries: Vec<SensorEntry>) -> Vec<SensorEntry> {
    entries.sort_by_key(|e| e.created_at);
    entries
}

fn format_timestamp(seconds: i64, pattern: &str) -> String {
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(time) => time.format(pattern).to_string(),
        None => seconds.to_string(),
    }
}
