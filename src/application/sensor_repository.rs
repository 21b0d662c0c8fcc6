// Repository trait for sensor data access
use crate::domain::sensor::{Sensor, SensorEntry};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SensorRepository: Send + Sync {
    /// List all sensors known to the server
    async fn list_sensors(&self) -> Result<Vec<Sensor>>;

    /// Fetch one sensor; unknown ids fail with `DashboardError::NotFound`
    async fn get_sensor(&self, id: &str) -> Result<Sensor>;

    /// Fetch a sensor's readings in whatever order the server returns them
    async fn get_sensor_history(&self, id: &str) -> Result<Vec<SensorEntry>>;
}
