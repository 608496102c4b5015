pub mod cache;
pub mod config;
pub mod telemetry;

pub use cache::{global_cache, ModelCache, ModelOptions};
pub use config::Settings;
pub use telemetry::init_tracing;
