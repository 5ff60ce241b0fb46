//! Single-record lookups for stores and events

use crate::config::ConciergeConfig;
use crate::error::ToolError;
use crate::sandbox::executor::quote_identifier;
use crate::sandbox::{QueryOutput, SqlSandbox};
use crate::tools::base::get_parameter;
use crate::tools::{Tool, ToolExample};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// First row of a lookup, or a not-found error naming the search term
fn first_row(output: QueryOutput, tool: &str, what: &str, term: &str) -> Result<Value, ToolError> {
    output
        .results
        .into_iter()
        .next()
        .map(Value::Object)
        .ok_or_else(|| ToolError::ExecutionFailed {
            name: tool.to_string(),
            message: format!("{} '{}' was not found", what, term),
        })
}

fn optional_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(_) => get_parameter(args, key),
    }
}

/// `get_store_info`: full record of one store by id or name
pub struct StoreInfoTool {
    sandbox: SqlSandbox,
    query: String,
}

impl StoreInfoTool {
    pub fn new(config: &ConciergeConfig) -> Self {
        // Exact id match takes precedence over a partial name match
        let query = format!(
            "SELECT * FROM {} \
             WHERE (?1 <> '' AND upper(store_id) = upper(?1)) \
                OR (?2 <> '' AND instr(lower(store_name), lower(?2)) > 0) \
             ORDER BY (?1 <> '' AND upper(store_id) = upper(?1)) DESC \
             LIMIT 1",
            quote_identifier(&config.stores.virtual_name)
        );

        Self {
            sandbox: SqlSandbox::for_source(config, &config.stores),
            query,
        }
    }
}

#[async_trait]
impl Tool for StoreInfoTool {
    fn name(&self) -> &str {
        "get_store_info"
    }

    fn description(&self) -> &str {
        "get_store_info: Get the full record of one store by name (partial match) or store id. \
         Returns store_name, description, category, opening_hours, irregular_closures, phone, email and address. \
         Use it to check opening information or contact details. The store id is for internal use only \
         and must not be shown to the user."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "store_name": {
                    "type": "string",
                    "description": "Store name or part of it",
                    "default": ""
                },
                "store_id": {
                    "type": "string",
                    "description": "Store id such as STR-0001 (internal use only)",
                    "default": ""
                }
            }
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let store_name = optional_string(&args, "store_name")?;
        let store_id = optional_string(&args, "store_id")?;

        if store_name.trim().is_empty() && store_id.trim().is_empty() {
            return Err(ToolError::InvalidParameters {
                message: "Specify a store name or store id".to_string(),
            });
        }

        let sandbox = self.sandbox.clone();
        let query = self.query.clone();
        let (id, name) = (store_id.clone(), store_name.clone());
        let output = tokio::task::spawn_blocking(move || {
            sandbox.execute_with_params(&query, [id.as_str(), name.as_str()])
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            message: e.to_string(),
        })??;

        let term = if store_id.is_empty() { &store_name } else { &store_id };
        first_row(output, self.name(), "Store", term)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Look up a store by name".to_string(),
            parameters: json!({ "store_name": "Bakery" }),
            expected_result: "The first store whose name contains 'Bakery'".to_string(),
        }]
    }
}

/// `get_event_info`: full record of one event by name
pub struct EventInfoTool {
    sandbox: SqlSandbox,
    query: String,
}

impl EventInfoTool {
    pub fn new(config: &ConciergeConfig) -> Self {
        let query = format!(
            "SELECT * FROM {} WHERE instr(lower(event_name), lower(?1)) > 0 LIMIT 1",
            quote_identifier(&config.events.virtual_name)
        );

        Self {
            sandbox: SqlSandbox::for_source(config, &config.events),
            query,
        }
    }
}

#[async_trait]
impl Tool for EventInfoTool {
    fn name(&self) -> &str {
        "get_event_info"
    }

    fn description(&self) -> &str {
        "get_event_info: Get the full record of one event by name (partial match). \
         Returns event_name, description, date_time, location, capacity, contact_info, cost, \
         registration_required and target_audience."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "event_name": {
                    "type": "string",
                    "description": "Event name or part of it"
                }
            },
            "required": ["event_name"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let event_name = optional_string(&args, "event_name")?;
        if event_name.trim().is_empty() {
            return Err(ToolError::InvalidParameters {
                message: "Specify an event name".to_string(),
            });
        }

        let sandbox = self.sandbox.clone();
        let query = self.query.clone();
        let term = event_name.clone();
        let output = tokio::task::spawn_blocking(move || {
            sandbox.execute_with_params(&query, [term.as_str()])
        })
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            message: e.to_string(),
        })??;

        first_row(output, self.name(), "Event", &event_name)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Look up an event by name".to_string(),
            parameters: json!({ "event_name": "Jazz" }),
            expected_result: "The first event whose name contains 'Jazz'".to_string(),
        }]
    }
}
