// Sensor service - One-shot loads behind the list, detail and history views
use crate::application::sensor_repository::SensorRepository;
use crate::domain::sensor::{sort_entries_by_created_at, Sensor, SensorEntry};
use crate::error::DashboardError;
use std::sync::Arc;

/// Outcome of a fetch a view issues when it is shown
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Pending,
    Ready(T),
    /// User-facing message; the underlying error has already been logged
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorHistory {
    pub sensor: Sensor,
    /// Ascending by `created_at`
    pub entries: Vec<SensorEntry>,
}

#[derive(Clone)]
pub struct SensorService {
    repository: Arc<dyn SensorRepository>,
}

impl SensorService {
    pub fn new(repository: Arc<dyn SensorRepository>) -> Self {
        Self { repository }
    }

    pub async fn load_sensor_list(&self) -> LoadState<Vec<Sensor>> {
        match self.repository.list_sensors().await {
            Ok(sensors) => LoadState::Ready(sensors),
            Err(e) => {
                tracing::error!("Error fetching sensors: {}", e);
                LoadState::Failed("Failed to load sensors".to_string())
            }
        }
    }

    pub async fn load_sensor_detail(&self, id: &str) -> LoadState<Sensor> {
        match self.repository.get_sensor(id).await {
            Ok(sensor) => LoadState::Ready(sensor),
            Err(DashboardError::NotFound(_)) => LoadState::Failed("Sensor not found".to_string()),
            Err(e) => {
                tracing::error!("Error fetching sensor {}: {}", id, e);
                LoadState::Failed("Failed to load sensor details".to_string())
            }
        }
    }

    /// Fetch the sensor and its readings concurrently; the first failure wins
    pub async fn load_sensor_history(&self, id: &str) -> LoadState<SensorHistory> {
        let fetched = tokio::try_join!(
            self.repository.get_sensor(id),
            self.repository.get_sensor_history(id)
        );

        match fetched {
            Ok((sensor, entries)) => LoadState::Ready(SensorHistory {
                sensor,
                entries: sort_entries_by_created_at(entries),
            }),
            Err(e) => {
                tracing::error!("Error fetching history for sensor {}: {}", id, e);
                LoadState::Failed("Failed to load history data".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sensor_repository::MockSensorRepository;

    fn entry(id: &str, sensor_id: &str, created_at: i64) -> SensorEntry {
        SensorEntry::new(id, sensor_id, created_at as f64 / 10.0, created_at)
    }

    #[tokio::test]
    async fn test_list_ready() {
        let mut mock = MockSensorRepository::new();
        mock.expect_list_sensors().returning(|| {
            Box::pin(async { Ok(vec![Sensor::new("s1", "Kitchen", 0)]) })
        });

        let service = SensorService::new(Arc::new(mock));
        let state = service.load_sensor_list().await;
        assert_eq!(state, LoadState::Ready(vec![Sensor::new("s1", "Kitchen", 0)]));
    }

    #[tokio::test]
    async fn test_list_failure_is_generic_message() {
        let mut mock = MockSensorRepository::new();
        mock.expect_list_sensors().returning(|| {
            Box::pin(async { Err(DashboardError::Network("connection refused".to_string())) })
        });

        let service = SensorService::new(Arc::new(mock));
        assert_eq!(
            service.load_sensor_list().await,
            LoadState::Failed("Failed to load sensors".to_string())
        );
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let mut mock = MockSensorRepository::new();
        mock.expect_get_sensor().returning(|id| {
            let id = id.to_string();
            Box::pin(async move { Err(DashboardError::NotFound(id)) })
        });

        let service = SensorService::new(Arc::new(mock));
        assert_eq!(
            service.load_sensor_detail("nope").await,
            LoadState::Failed("Sensor not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_detail_server_error() {
        let mut mock = MockSensorRepository::new();
        mock.expect_get_sensor().returning(|_| {
            Box::pin(async {
                Err(DashboardError::Server {
                    status: 503,
                    body: String::new(),
                })
            })
        });

        let service = SensorService::new(Arc::new(mock));
        assert_eq!(
            service.load_sensor_detail("s1").await,
            LoadState::Failed("Failed to load sensor details".to_string())
        );
    }

    #[tokio::test]
    async fn test_history_is_sorted_ascending() {
        let mut mock = MockSensorRepository::new();
        mock.expect_get_sensor().returning(|id| {
            let sensor = Sensor::new(id.to_string(), "Boiler room", 0);
            Box::pin(async move { Ok(sensor) })
        });
        mock.expect_get_sensor_history().returning(|id| {
            let id = id.to_string();
            Box::pin(async move {
                Ok(vec![
                    entry("c", &id, 300),
                    entry("a", &id, 100),
                    entry("b", &id, 200),
                ])
            })
        });

        let service = SensorService::new(Arc::new(mock));
        let LoadState::Ready(history) = service.load_sensor_history("s1").await else {
            panic!("history did not load");
        };

        let times: Vec<i64> = history.entries.iter().map(|e| e.created_at).collect();
        assert_eq!(times, vec![100, 200, 300]);
        assert!(history.entries.iter().all(|e| e.sensor_id == history.sensor.id));
    }

    #[tokio::test]
    async fn test_history_fails_when_either_fetch_fails() {
        let mut mock = MockSensorRepository::new();
        mock.expect_get_sensor().returning(|id| {
            let sensor = Sensor::new(id.to_string(), "Boiler room", 0);
            Box::pin(async move { Ok(sensor) })
        });
        mock.expect_get_sensor_history().returning(|_| {
            Box::pin(async { Err(DashboardError::Decode("bad body".to_string())) })
        });

        let service = SensorService::new(Arc::new(mock));
        let state = service.load_sensor_history("s1").await;
        assert_eq!(state, LoadState::Failed("Failed to load history data".to_string()));
        assert!(!state.is_ready());
    }
}
