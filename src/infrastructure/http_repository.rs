// HTTP repository implementation over the sensor REST API
use crate::application::sensor_repository::SensorRepository;
use crate::domain::sensor::{Sensor, SensorEntry};
use crate::error::{DashboardError, Result};
use crate::infrastructure::config::ApiSettings;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct HttpSensorRepository {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSensorRepository {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.http_base(),
        })
    }

    fn sensor_url(&self, id: &str, suffix: &str) -> String {
        format!("{}/sensor/{}{}", self.base_url, urlencoding::encode(id), suffix)
    }

    async fn execute_get<T: DeserializeOwned>(&self, url: &str, id: Option<&str>) -> Result<T> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DashboardError::Network(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(DashboardError::NotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let data = response
            .json::<T>()
            .await
            .map_err(|e| DashboardError::Decode(format!("GET {}: {}", url, e)))?;
        tracing::debug!("GET {} -> {}", url, status);

        Ok(data)
    }
}

#[async_trait]
impl SensorRepository for HttpSensorRepository {
    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        let url = format!("{}/sensor", self.base_url);
        self.execute_get(&url, None).await
    }

    async fn get_sensor(&self, id: &str) -> Result<Sensor> {
        let url = self.sensor_url(id, "");
        self.execute_get(&url, Some(id)).await
    }

    async fn get_sensor_history(&self, id: &str) -> Result<Vec<SensorEntry>> {
        let url = self.sensor_url(id, "/history");
        self.execute_get(&url, Some(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::{Json, Router};

    fn sensors() -> Vec<Sensor> {
        vec![
            Sensor::new("s1", "Kitchen", 1_700_000_000),
            Sensor::new("s2", "Garage", 1_700_000_100),
        ]
    }

    async fn get_sensor(Path(id): Path<String>) -> std::result::Result<Json<Sensor>, AxumStatus> {
        sensors()
            .into_iter()
            .find(|s| s.id == id)
            .map(Json)
            .ok_or(AxumStatus::NOT_FOUND)
    }

    async fn get_history(Path(id): Path<String>) -> std::result::Result<Json<Vec<SensorEntry>>, AxumStatus> {
        if !sensors().iter().any(|s| s.id == id) {
            return Err(AxumStatus::NOT_FOUND);
        }
        Ok(Json(vec![
            SensorEntry::new("e2", id.clone(), 2.0, 200),
            SensorEntry::new("e1", id, 1.0, 100),
        ]))
    }

    async fn spawn_api(router: Router) -> ApiSettings {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        ApiSettings {
            base_url: format!("http://{}/", addr),
            ws_url: None,
            timeout_secs: 5,
        }
    }

    async fn fake_api() -> HttpSensorRepository {
        let router = Router::new()
            .route("/sensor", get(|| async { Json(sensors()) }))
            .route("/sensor/:id", get(get_sensor))
            .route("/sensor/:id/history", get(get_history));
        HttpSensorRepository::new(&spawn_api(router).await).unwrap()
    }

    #[tokio::test]
    async fn test_list_sensors() {
        let repository = fake_api().await;
        let listed = repository.list_sensors().await.unwrap();
        assert_eq!(listed, sensors());
    }

    #[tokio::test]
    async fn test_sensor_then_history_belong_to_same_sensor() {
        let repository = fake_api().await;

        let sensor = repository.get_sensor("s2").await.unwrap();
        assert_eq!(sensor.label, "Garage");

        let history = repository.get_sensor_history("s2").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|e| e.sensor_id == sensor.id));
        // Server order is preserved
        assert_eq!(history[0].id, "e2");
    }

    #[tokio::test]
    async fn test_unknown_sensor_is_not_found() {
        let repository = fake_api().await;
        let err = repository.get_sensor("missing").await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(id) if id == "missing"));

        let err = repository.get_sensor_history("missing").await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let router = Router::new().route(
            "/sensor",
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "database down") }),
        );
        let repository = HttpSensorRepository::new(&spawn_api(router).await).unwrap();

        match repository.list_sensors().await.unwrap_err() {
            DashboardError::Server { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "database down");
            }
            other => panic!("expected DashboardError::Server, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_body_is_decode_error() {
        let router = Router::new().route("/sensor", get(|| async { "[{\"id\": 1}]" }));
        let repository = HttpSensorRepository::new(&spawn_api(router).await).unwrap();

        let err = repository.list_sensors().await.unwrap_err();
        assert!(matches!(err, DashboardError::Decode(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let settings = ApiSettings {
            base_url: "http://127.0.0.1:1".to_string(),
            ws_url: None,
            timeout_secs: 5,
        };
        let repository = HttpSensorRepository::new(&settings).unwrap();

        let err = repository.list_sensors().await.unwrap_err();
        assert!(matches!(err, DashboardError::Network(_)), "{err:?}");
    }

    #[test]
    fn test_sensor_url_encodes_identifier() {
        let settings = ApiSettings {
            base_url: "http://api.local/".to_string(),
            ws_url: None,
            timeout_secs: 5,
        };
        let repository = HttpSensorRepository::new(&settings).unwrap();
        assert_eq!(
            repository.sensor_url("a b/c", "/history"),
            "http://api.local/sensor/a%20b%2Fc/history"
        );
    }
}
