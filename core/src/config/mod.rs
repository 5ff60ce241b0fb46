//! Minimal configuration module for concierge core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{
    ConciergeConfig, DataSource, SandboxConfig, WeatherConfig, MAX_RESULT_ROWS,
};
