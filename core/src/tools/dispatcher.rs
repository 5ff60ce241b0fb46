//! Exactly-once execution of tool calls within a turn

use crate::error::ToolError;
use crate::tools::{ToolCall, ToolRegistry, ToolResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Runs each call id through its shim at most once.
///
/// A repeated call id, including one raced concurrently, receives the
/// result recorded by the first execution.
pub struct CallDispatcher {
    registry: Arc<ToolRegistry>,
    calls: Mutex<HashMap<String, Arc<OnceCell<ToolResult>>>>,
}

impl CallDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute `call`, or return the result already recorded for its id
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let cell = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(calls.entry(call.id.clone()).or_default())
        };

        if cell.initialized() {
            debug!("Call '{}' already executed, reusing result", call.id);
        }

        cell.get_or_init(|| self.run(call)).await.clone()
    }

    /// Whether a call id has been seen by this dispatcher
    pub fn contains(&self, call_id: &str) -> bool {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(call_id)
    }

    async fn run(&self, call: &ToolCall) -> ToolResult {
        let start_time = Instant::now();

        let outcome = match self.registry.shim(&call.name) {
            Some(shim) => shim.invoke(call.parameters.clone()).await,
            None => Err(ToolError::NotFound {
                name: call.name.clone(),
            }),
        };
        let duration = start_time.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(data) => ToolResult::success(&call.id, &call.name, data),
            Err(err) => {
                warn!("Tool '{}' failed: {}", call.name, err);
                ToolResult::error(&call.id, &call.name, &err)
            }
        };
        result.with_duration(duration)
    }
}
