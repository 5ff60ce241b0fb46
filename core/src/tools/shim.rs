//! Provider-bound calling shapes for registered tools

use crate::error::ToolError;
use crate::tools::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Tool definition for provider function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (usually "function")
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function definition
    pub function: FunctionDefinition,
}

/// Function definition for tool calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,

    /// Description of what the function does
    pub description: String,

    /// JSON schema for the function parameters
    pub parameters: Value,
}

/// One statically named parameter of a named shim
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
}

/// How a shim maps incoming arguments onto the tool
#[derive(Debug, Clone, PartialEq)]
pub enum ShimSignature {
    /// Free-form keyword arguments, forwarded untouched
    PassThrough,
    /// Fixed parameter list; unknown keys are dropped, defaults filled in
    Named(Vec<NamedParam>),
}

impl ShimSignature {
    /// Derive a named signature from a JSON parameter schema
    pub fn from_schema(schema: &Value) -> Self {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let params = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .iter()
                    .map(|(name, property)| NamedParam {
                        name: name.clone(),
                        required: required.contains(&name.as_str()),
                        default: property.get("default").cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        ShimSignature::Named(params)
    }
}

/// Builds a shim for a tool
pub type ShimBuilder = Arc<dyn Fn(Arc<dyn Tool>) -> ToolShim + Send + Sync>;

/// Shim-building strategy looked up by tool name
#[derive(Clone)]
pub enum ShimStrategy {
    PassThrough,
    Named,
    Custom(ShimBuilder),
}

impl ShimStrategy {
    pub fn custom<F>(builder: F) -> Self
    where
        F: Fn(Arc<dyn Tool>) -> ToolShim + Send + Sync + 'static,
    {
        ShimStrategy::Custom(Arc::new(builder))
    }

    pub fn build(&self, tool: Arc<dyn Tool>) -> ToolShim {
        match self {
            ShimStrategy::PassThrough => ToolShim::pass_through(tool),
            ShimStrategy::Named => ToolShim::named(tool),
            ShimStrategy::Custom(builder) => builder(tool),
        }
    }
}

impl fmt::Debug for ShimStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShimStrategy::PassThrough => write!(f, "PassThrough"),
            ShimStrategy::Named => write!(f, "Named"),
            ShimStrategy::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// A tool bound to the calling shape the orchestrator expects
#[derive(Clone)]
pub struct ToolShim {
    tool: Arc<dyn Tool>,
    signature: ShimSignature,
}

impl ToolShim {
    pub fn pass_through(tool: Arc<dyn Tool>) -> Self {
        Self::with_signature(tool, ShimSignature::PassThrough)
    }

    /// Named shim derived from the tool's own parameter schema
    pub fn named(tool: Arc<dyn Tool>) -> Self {
        let signature = ShimSignature::from_schema(&tool.parameters_schema());
        Self::with_signature(tool, signature)
    }

    pub fn with_signature(tool: Arc<dyn Tool>, signature: ShimSignature) -> Self {
        Self { tool, signature }
    }

    pub fn name(&self) -> &str {
        self.tool.name()
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }

    pub fn signature(&self) -> &ShimSignature {
        &self.signature
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.tool.name().to_string(),
                description: self.tool.description().to_string(),
                parameters: self.tool.parameters_schema(),
            },
        }
    }

    /// Map incoming arguments onto the shim's signature
    pub fn bind(&self, mut args: Map<String, Value>) -> Result<Map<String, Value>, ToolError> {
        let params = match &self.signature {
            ShimSignature::PassThrough => return Ok(args),
            ShimSignature::Named(params) => params,
        };

        let mut bound = Map::new();
        for param in params {
            match args.remove(&param.name) {
                Some(value) => {
                    bound.insert(param.name.clone(), value);
                }
                None => match &param.default {
                    Some(default) => {
                        bound.insert(param.name.clone(), default.clone());
                    }
                    None if param.required => {
                        return Err(ToolError::InvalidParameters {
                            message: format!("Missing parameter: {}", param.name),
                        });
                    }
                    None => {}
                },
            }
        }

        if !args.is_empty() {
            let ignored: Vec<&String> = args.keys().collect();
            debug!("Shim for '{}' ignored arguments {:?}", self.name(), ignored);
        }

        Ok(bound)
    }

    /// Bind the arguments and execute the tool
    pub async fn invoke(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let bound = self.bind(args)?;
        self.tool.execute(bound).await
    }
}

impl fmt::Debug for ToolShim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolShim")
            .field("tool", &self.tool.name())
            .field("signature", &self.signature)
            .finish()
    }
}
