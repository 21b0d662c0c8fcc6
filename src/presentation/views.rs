// Text views for the sensor list, a sensor's live reading and its history
use crate::application::sensor_service::{LoadState, SensorHistory};
use crate::domain::live::{ConnectionState, LiveSnapshot};
use crate::domain::sensor::Sensor;
use std::fmt::Write;

pub const UNIT: &str = "PPM";
pub const ALERT_MESSAGE: &str = "WARNING: HIGH GAS LEVELS";
pub const EMPTY_SENSOR_LIST: &str = "No sensors found.";
pub const EMPTY_HISTORY: &str = "No data points.";

const CHART_WIDTH: usize = 60;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn render_not_ready<T>(state: &LoadState<T>) -> String {
    match state {
        LoadState::Pending => "Loading...\n".to_string(),
        LoadState::Failed(message) => format!("! {}\n", message),
        LoadState::Ready(_) => String::new(),
    }
}

pub fn render_sensor_list(state: &LoadState<Vec<Sensor>>) -> String {
    let sensors = match state {
        LoadState::Ready(sensors) => sensors,
        other => return render_not_ready(other),
    };

    let mut out = String::new();
    let _ = writeln!(out, "Available Sensors (Total: {})", sensors.len());
    let _ = writeln!(out);

    if sensors.is_empty() {
        let _ = writeln!(out, "  {}", EMPTY_SENSOR_LIST);
        return out;
    }

    for sensor in sensors {
        let _ = writeln!(out, "- {}  [{}]", sensor.label, sensor.short_id());
        let _ = writeln!(out, "    Created: {}", sensor.created_date());
        let _ = writeln!(out, "    Open:    show {}", sensor.id);
    }
    out
}

/// The alert fires when the latest reading exceeds `threshold`
pub fn is_alert(live: &LiveSnapshot, threshold: f64) -> bool {
    live.last_entry
        .as_ref()
        .map(|e| e.value > threshold)
        .unwrap_or(false)
}

fn connection_label(state: ConnectionState) -> String {
    match state {
        ConnectionState::Open => "LIVE".to_string(),
        ConnectionState::Connecting => "CONNECTING".to_string(),
        ConnectionState::Reconnecting { attempt } => format!("RECONNECTING ({})", attempt),
        ConnectionState::Idle | ConnectionState::Closed => "OFFLINE".to_string(),
    }
}

pub fn render_sensor_detail(state: &LoadState<Sensor>, live: &LiveSnapshot, threshold: f64) -> String {
    let sensor = match state {
        LoadState::Ready(sensor) => sensor,
        other => return render_not_ready(other),
    };

    let reading = live
        .last_entry
        .as_ref()
        .map(|e| format!("{:.2}", e.value))
        .unwrap_or_else(|| "--".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "{}  ({})", sensor.display_name(), sensor.id);
    let _ = writeln!(out);
    let _ = writeln!(out, "Real-time Reading  [{}]", connection_label(live.state));
    let _ = writeln!(out, "    {} {}", reading, UNIT);
    if let Some(entry) = &live.last_entry {
        let _ = writeln!(out, "    at {}", entry.created_time());
    }
    if is_alert(live, threshold) {
        let _ = writeln!(out, "    {}", ALERT_MESSAGE);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "View Full History: history {}", sensor.id);
    out
}

pub fn render_sensor_history(state: &LoadState<SensorHistory>, sensor_id: &str) -> String {
    let history = match state {
        LoadState::Ready(history) => history,
        other => return render_not_ready(other),
    };

    let name = if history.sensor.label.is_empty() {
        sensor_id
    } else {
        history.sensor.label.as_str()
    };

    let mut out = String::new();
    let _ = writeln!(out, "History: {}", name);
    let _ = writeln!(out, "Data Points: {}", history.entries.len());
    let _ = writeln!(out);

    let (Some(first), Some(last)) = (history.entries.first(), history.entries.last()) else {
        let _ = writeln!(out, "  {}", EMPTY_HISTORY);
        return out;
    };

    let values: Vec<f64> = history.entries.iter().map(|e| e.value).collect();
    let _ = writeln!(out, "  {}", sparkline(&values, CHART_WIDTH));
    let _ = writeln!(out, "  {} -> {}", first.created_time(), last.created_time());
    let _ = writeln!(out);

    for entry in &history.entries {
        let _ = writeln!(out, "  {}  {:>10.2}", entry.created_time(), entry.value);
    }
    out
}

/// One character per value, scaled between the minimum and maximum.
/// Longer series are bucket-averaged down to exactly `width` characters.
pub fn sparkline(values: &[f64], width: usize) -> String {
    let values = downsample(values, width);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                return SPARK_LEVELS[SPARK_LEVELS.len() / 2];
            }
            let level = ((v - min) / span * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn downsample(values: &[f64], max_points: usize) -> Vec<f64> {
    if max_points == 0 || values.len() <= max_points {
        return values.to_vec();
    }

    // Bucket i covers i*len/max..(i+1)*len/max, so every bucket is non-empty
    let len = values.len();
    (0..max_points)
        .map(|i| {
            let bucket = &values[i * len / max_points..(i + 1) * len / max_points];
            bucket.iter().sum::<f64>() / bucket.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sensor::{sort_entries_by_created_at, SensorEntry};

    fn live(state: ConnectionState, value: Option<f64>) -> LiveSnapshot {
        LiveSnapshot {
            state,
            last_entry: value.map(|v| SensorEntry::new("e1", "s1", v, 1000)),
        }
    }

    #[test]
    fn test_empty_sensor_list_has_explicit_empty_state() {
        let out = render_sensor_list(&LoadState::Ready(vec![]));
        assert!(out.contains(EMPTY_SENSOR_LIST));
        assert!(out.contains("Total: 0"));
    }

    #[test]
    fn test_sensor_list_renders_one_card_per_sensor() {
        let sensors = vec![
            Sensor::new("0123456789", "Kitchen", 0),
            Sensor::new("abcdefghij", "Garage", 86_400),
        ];
        let out = render_sensor_list(&LoadState::Ready(sensors));

        assert!(out.contains("Total: 2"));
        assert!(out.contains("- Kitchen  [01234567...]"));
        assert!(out.contains("- Garage  [abcdefgh...]"));
        assert!(out.contains("Created: 1970-01-02"));
        assert!(!out.contains(EMPTY_SENSOR_LIST));
    }

    #[test]
    fn test_pending_and_failed_states() {
        assert_eq!(render_sensor_list(&LoadState::Pending), "Loading...\n");
        assert_eq!(
            render_sensor_list(&LoadState::Failed("Failed to load sensors".to_string())),
            "! Failed to load sensors\n"
        );
    }

    #[test]
    fn test_detail_without_reading() {
        let sensor = LoadState::Ready(Sensor::new("s1", "Kitchen", 0));
        let out = render_sensor_detail(&sensor, &live(ConnectionState::Connecting, None), 1000.0);

        assert!(out.contains("-- PPM"));
        assert!(out.contains("[CONNECTING]"));
        assert!(!out.contains(ALERT_MESSAGE));
    }

    #[test]
    fn test_detail_live_reading_and_alert() {
        let sensor = LoadState::Ready(Sensor::new("s1", "Kitchen", 0));

        let out = render_sensor_detail(&sensor, &live(ConnectionState::Open, Some(42.5)), 1000.0);
        assert!(out.contains("42.50 PPM"));
        assert!(out.contains("[LIVE]"));
        assert!(!out.contains(ALERT_MESSAGE));

        let out = render_sensor_detail(&sensor, &live(ConnectionState::Closed, Some(1000.5)), 1000.0);
        assert!(out.contains("1000.50 PPM"));
        assert!(out.contains("[OFFLINE]"));
        assert!(out.contains(ALERT_MESSAGE));
    }

    #[test]
    fn test_alert_requires_strictly_greater_value() {
        assert!(!is_alert(&live(ConnectionState::Open, Some(1000.0)), 1000.0));
        assert!(is_alert(&live(ConnectionState::Open, Some(1000.01)), 1000.0));
        assert!(!is_alert(&live(ConnectionState::Open, None), 1000.0));
    }

    #[test]
    fn test_history_lists_entries_in_ascending_order() {
        let entries = sort_entries_by_created_at(vec![
            SensorEntry::new("c", "s1", 3.0, 300),
            SensorEntry::new("a", "s1", 1.0, 100),
            SensorEntry::new("b", "s1", 2.0, 200),
        ]);
        let history = SensorHistory {
            sensor: Sensor::new("s1", "Kitchen", 0),
            entries,
        };
        let out = render_sensor_history(&LoadState::Ready(history), "s1");

        assert!(out.contains("History: Kitchen"));
        assert!(out.contains("Data Points: 3"));
        let positions: Vec<usize> = ["00:01:40", "00:03:20", "00:05:00"]
            .iter()
            .map(|t| out.rfind(t).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_history_and_label_fallback() {
        let history = SensorHistory {
            sensor: Sensor::new("s1", "", 0),
            entries: vec![],
        };
        let out = render_sensor_history(&LoadState::Ready(history), "s1");
        assert!(out.contains("History: s1"));
        assert!(out.contains(EMPTY_HISTORY));
    }

    #[test]
    fn test_sparkline_scales_between_min_and_max() {
        assert_eq!(sparkline(&[0.0, 7.0, 14.0], 60), "▁▅█");
        assert_eq!(sparkline(&[5.0, 5.0], 60), "▅▅");
        assert_eq!(sparkline(&[], 60), "");
    }

    #[test]
    fn test_sparkline_downsamples_long_series() {
        let values: Vec<f64> = (0..120).map(f64::from).collect();
        assert_eq!(sparkline(&values, 60).chars().count(), 60);
    }

    #[test]
    fn test_sparkline_fills_width_for_uneven_series() {
        let values: Vec<f64> = (0..61).map(f64::from).collect();
        let line: Vec<char> = sparkline(&values, 60).chars().collect();

        assert_eq!(line.len(), 60);
        assert_eq!(line[0], '▁');
        assert_eq!(line[59], '█');
    }
}
