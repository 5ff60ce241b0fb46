//! Built-in tools

pub mod lookup;
pub mod math;
pub mod sql_search;
pub mod store_hours;
pub mod time;
pub mod weather;

pub use lookup::{EventInfoTool, StoreInfoTool};
pub use math::MultiplyTool;
pub use sql_search::SqlSearchTool;
pub use store_hours::StoreHoursTool;
pub use time::CurrentTimeTool;
pub use weather::WeatherTool;

use crate::config::ConciergeConfig;
use crate::error::RegistrationError;
use crate::tools::{ShimStrategy, ToolRegistry};
use std::collections::HashMap;
use std::sync::Arc;

/// Tools the orchestrator calls with a fixed, named parameter list.
/// Anything not listed gets a pass-through shim.
const NAMED_SHIM_TOOLS: &[&str] = &[
    "get_current_time",
    "search_events",
    "search_stores",
    "search_products",
    "get_store_info",
    "get_event_info",
    "check_store_hours",
    "get_weather",
];

/// Shim strategy table for the built-in tools
pub fn default_strategies() -> HashMap<String, ShimStrategy> {
    NAMED_SHIM_TOOLS
        .iter()
        .map(|name| (name.to_string(), ShimStrategy::Named))
        .collect()
}

/// Register every built-in tool, failing on the first duplicate name
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    config: &ConciergeConfig,
) -> Result<(), RegistrationError> {
    registry.register(Arc::new(CurrentTimeTool::new()))?;
    registry.register(Arc::new(SqlSearchTool::events(config)))?;
    registry.register(Arc::new(SqlSearchTool::stores(config)))?;
    registry.register(Arc::new(SqlSearchTool::products(config)))?;
    registry.register(Arc::new(StoreInfoTool::new(config)))?;
    registry.register(Arc::new(EventInfoTool::new(config)))?;
    registry.register(Arc::new(StoreHoursTool::new(config)))?;
    registry.register(Arc::new(WeatherTool::new(config.weather.clone())))?;
    registry.register(Arc::new(MultiplyTool::new()))?;
    Ok(())
}

/// A registry holding the built-in tools with their default shims
pub fn builtin_registry(config: &ConciergeConfig) -> Result<ToolRegistry, RegistrationError> {
    let mut registry = ToolRegistry::with_strategies(default_strategies());
    register_builtin_tools(&mut registry, config)?;
    Ok(registry)
}
