pub mod config;
pub mod error;
pub mod idss;
pub mod telemetry;
