// Application layer - Use cases and the ports they depend on
pub mod live_subscription;
pub mod live_transport;
pub mod sensor_repository;
pub mod sensor_service;
