pub mod config;
pub mod error;
pub mod needs;
pub mod planning;
pub mod reasoning;
pub mod telemetry;
