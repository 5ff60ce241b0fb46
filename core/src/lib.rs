//! # concierge Core
//!
//! Core library for concierge - the tool-calling event pipeline behind a
//! streaming LLM concierge backend.
//!
//! This library normalizes the tool-argument fragments emitted by different
//! model vendors into uniform events, registers tools behind typed shims with
//! exactly-once dispatch, and answers model-authored SQL from a read-only
//! sandbox over CSV files.

// Core modules
pub mod config;
pub mod error;
pub mod sandbox;
pub mod session;
pub mod stream;
pub mod tools;

// Re-export commonly used types
pub use config::{ConciergeConfig, DataSource, SandboxConfig, WeatherConfig};
pub use error::{Error, Result};
pub use sandbox::{QueryOutput, SqlSandbox};
pub use session::ConciergeSession;
pub use stream::{EventEnvelope, EventKind, RawChunk, StreamEvent, StreamEventNormalizer, ToolEvent};
pub use tools::{CallDispatcher, Tool, ToolCall, ToolRegistry, ToolResult};

/// Current version of the concierge-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
