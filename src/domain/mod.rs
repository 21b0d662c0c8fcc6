// Domain layer - Records exchanged with the sensor API
pub mod live;
pub mod sensor;
