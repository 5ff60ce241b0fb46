//! Tool registry for managing available tools

use crate::error::{RegistrationError, ToolError};
use crate::tools::shim::{ShimStrategy, ToolDefinition, ToolShim};
use crate::tools::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Name and description pair used to build the system prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
}

/// Registry owning every tool available to a session.
///
/// Constructed explicitly and handed to whatever needs it; it is read-only
/// once registration is finished.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
    shims: Vec<ToolShim>,
    strategies: HashMap<String, ShimStrategy>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a shim strategy table
    pub fn with_strategies(strategies: HashMap<String, ShimStrategy>) -> Self {
        Self {
            strategies,
            ..Self::default()
        }
    }

    /// Set the shim strategy used for a tool registered later
    pub fn set_strategy<S: Into<String>>(&mut self, name: S, strategy: ShimStrategy) {
        self.strategies.insert(name.into(), strategy);
    }

    /// Register a tool and build its shim
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistrationError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistrationError::DuplicateName { name });
        }

        let strategy = self
            .strategies
            .get(&name)
            .cloned()
            .unwrap_or(ShimStrategy::PassThrough);
        debug!("Building {:?} shim for tool '{}'", strategy, name);

        self.shims.push(strategy.build(Arc::clone(&tool)));
        self.tools.insert(name.clone(), tool);
        info!("Registered tool '{}'", name);
        self.order.push(name);
        Ok(())
    }

    /// Execute a tool directly, without going through its shim
    pub async fn dispatch(&self, name: &str, args: Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;
        tool.execute(args).await
    }

    /// Every registered tool's name and description, in registration order
    pub fn describe_all(&self) -> Vec<ToolDescription> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDescription {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
            })
            .collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Provider-bound shims, in registration order
    pub fn shims(&self) -> &[ToolShim] {
        &self.shims
    }

    pub fn shim(&self, name: &str) -> Option<&ToolShim> {
        self.shims.iter().find(|shim| shim.name() == name)
    }

    /// Get tool definitions for provider function calling
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.shims.iter().map(ToolShim::definition).collect()
    }

    /// List all registered tool names
    pub fn list_tools(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Display form of a call's input, using the tool's formatter when known
    pub fn format_input(&self, name: &str, input: &Map<String, Value>) -> String {
        match self.get(name) {
            Some(tool) => tool.format_input(input),
            None => Value::Object(input.clone()).to_string(),
        }
    }

    /// Display form of a tool's output, using the tool's formatter when known
    pub fn format_output(&self, name: &str, output: &str) -> String {
        match self.get(name) {
            Some(tool) => tool.format_output(output),
            None => output.to_string(),
        }
    }
}
