//! Engine and bus configuration.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{BusConfig, Config, EngineConfig};
