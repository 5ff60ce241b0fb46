//! Tool system and built-in tools

pub mod base;
pub mod builtin;
pub mod dispatcher;
pub mod registry;
pub mod shim;

pub use base::{pretty_json, Tool, ToolCall, ToolExample, ToolResult};
pub use dispatcher::CallDispatcher;
pub use registry::{ToolDescription, ToolRegistry};
pub use shim::{
    FunctionDefinition, NamedParam, ShimSignature, ShimStrategy, ToolDefinition, ToolShim,
};
