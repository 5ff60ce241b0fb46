//! Error types and handling for concierge core

use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias for concierge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for concierge core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Tool registration errors
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// SQL sandbox errors
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// Upstream chunk stream errors
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

/// Raised while building a registry; always fatal at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Tool '{name}' is already registered")]
    DuplicateName { name: String },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("Request failed: {message}")]
    Http { message: String },
}

impl ToolError {
    /// The `{"error": ...}` shape handed back to the model
    pub fn to_wire(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Errors produced by the read-only SQL sandbox
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// The query shape was rejected before touching the engine
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The engine failed on a structurally valid query
    #[error("Query execution failed: {message}")]
    Execution { message: String },
}

impl SandboxError {
    pub fn execution<S: Into<String>>(message: S) -> Self {
        SandboxError::Execution {
            message: message.into(),
        }
    }

    /// The `{"error": ...}` shape returned by SQL tools
    pub fn to_wire(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<rusqlite::Error> for SandboxError {
    fn from(err: rusqlite::Error) -> Self {
        SandboxError::execution(err.to_string())
    }
}

/// Disallowed SQL statement shapes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("SQL query must be provided")]
    Empty,

    #[error("Only SELECT statements can be executed")]
    NotSelect,

    #[error("Forbidden operation detected: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("Multiple statements cannot be executed at once")]
    MultipleStatements,
}

/// Turn-fatal failures of the upstream chunk source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Upstream stream failed: {message}")]
    Upstream { message: String },

    #[error("Malformed chunk at line {line}: {message}")]
    MalformedChunk { line: usize, message: String },
}

impl StreamError {
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        StreamError::Upstream {
            message: message.into(),
        }
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
