//! Base tool traits and structures

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with already bound arguments
    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError>;

    /// Render the call arguments for display
    fn format_input(&self, input: &Map<String, Value>) -> String {
        pretty_json(&Value::Object(input.clone()))
    }

    /// Render the raw tool output for display
    fn format_output(&self, output: &str) -> String {
        match serde_json::from_str::<Value>(output) {
            Ok(value) => pretty_json(&value),
            Err(_) => output.to_string(),
        }
    }

    /// Get examples of how to use this tool
    fn examples(&self) -> Vec<ToolExample> {
        Vec::new()
    }
}

/// Pretty JSON with non-ASCII text left as-is
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool
    pub parameters: Map<String, Value>,

    /// Optional metadata
    pub metadata: Option<HashMap<String, Value>>,
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Name of the tool that produced it
    pub tool_name: String,

    /// Whether the execution was successful
    pub success: bool,

    /// Wire JSON text handed back to the model
    pub content: String,

    /// Structured form of `content`
    pub data: Value,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Example usage of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExample {
    /// Description of what this example does
    pub description: String,

    /// Example parameters
    pub parameters: Value,

    /// Expected result description
    pub expected_result: String,
}

impl ToolCall {
    /// Create a new tool call with a generated id
    pub fn new<S: Into<String>>(name: S, parameters: Map<String, Value>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, parameters)
    }

    /// Create a tool call carrying an upstream id
    pub fn with_id<I: Into<String>, S: Into<String>>(
        id: I,
        name: S,
        parameters: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parameters,
            metadata: None,
        }
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T, ToolError>
    where
        T: for<'de> Deserialize<'de>,
    {
        get_parameter(&self.parameters, key)
    }

    /// Get a parameter value by key with a default
    pub fn get_parameter_or<T>(&self, key: &str, default: T) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get_parameter(key).unwrap_or(default)
    }
}

/// Typed access to one argument of a bound argument map
pub fn get_parameter<T>(args: &Map<String, Value>, key: &str) -> Result<T, ToolError>
where
    T: for<'de> Deserialize<'de>,
{
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::InvalidParameters {
            message: format!("Missing parameter: {}", key),
        })?;

    serde_json::from_value(value.clone()).map_err(|_| ToolError::InvalidParameters {
        message: format!("Invalid parameter type for: {}", key),
    })
}

impl ToolResult {
    /// Create a successful result
    pub fn success<I: Into<String>, N: Into<String>>(tool_call_id: I, tool_name: N, data: Value) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            success: true,
            content: data.to_string(),
            data,
            duration_ms: None,
        }
    }

    /// Create an error result carrying the `{"error": ...}` wire shape
    pub fn error<I: Into<String>, N: Into<String>>(tool_call_id: I, tool_name: N, error: &ToolError) -> Self {
        let data = error.to_wire();
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            success: false,
            content: data.to_string(),
            data,
            duration_ms: None,
        }
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}
