//! Arithmetic tool

use crate::error::ToolError;
use crate::tools::{Tool, ToolExample};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

pub struct MultiplyTool;

impl MultiplyTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MultiplyTool {
    fn default() -> Self {
        Self::new()
    }
}

fn number<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ToolError> {
    match args.get(key) {
        Some(value @ Value::Number(_)) => Ok(value),
        Some(_) => Err(ToolError::InvalidParameters {
            message: format!("Invalid parameter type for: {}", key),
        }),
        None => Err(ToolError::InvalidParameters {
            message: format!("Missing parameter: {}", key),
        }),
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "?".to_string(),
    }
}

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two numbers. a: the first number, b: the second number"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number", "description": "The first number" },
                "b": { "type": "number", "description": "The second number" }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let a = number(&args, "a")?;
        let b = number(&args, "b")?;

        let product = match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x
                .checked_mul(y)
                .map(Value::from)
                .unwrap_or_else(|| json!(x as f64 * y as f64)),
            _ => {
                let x = a.as_f64().unwrap_or_default();
                let y = b.as_f64().unwrap_or_default();
                json!(x * y)
            }
        };

        debug!("Multiply: {} * {} = {}", a, b, product);
        Ok(product)
    }

    fn format_input(&self, input: &Map<String, Value>) -> String {
        format!("{} × {}", display(input.get("a")), display(input.get("b")))
    }

    fn format_output(&self, output: &str) -> String {
        format!("Result: {}", output)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Multiply two integers".to_string(),
            parameters: json!({ "a": 6, "b": 7 }),
            expected_result: "42".to_string(),
        }]
    }
}
