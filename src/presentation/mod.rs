// Presentation layer - Text rendering of the dashboard views
pub mod shell;
pub mod views;
