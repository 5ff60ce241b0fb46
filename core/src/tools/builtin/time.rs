//! Current wall-clock time in a named timezone

use crate::error::ToolError;
use crate::tools::{Tool, ToolExample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Timezone used when the model omits one
pub const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an IANA timezone name such as `America/New_York`
pub fn parse_timezone(name: &str) -> Result<Tz, ToolError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ToolError::InvalidParameters {
            message: format!("Unknown timezone: {}", name),
        })
}

/// `now` rendered as local time in `tz`
pub fn local_time(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "get_current_time: Return the current time in the given timezone. \
         timezone: IANA timezone name (e.g. 'Asia/Tokyo', 'America/New_York')"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name",
                    "default": DEFAULT_TIMEZONE
                }
            }
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let timezone = args
            .get("timezone")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_TIMEZONE);

        let tz = parse_timezone(timezone)?;
        let current = local_time(Utc::now(), tz);
        debug!("Current time for {}: {}", timezone, current);

        Ok(Value::String(current))
    }

    fn format_input(&self, input: &Map<String, Value>) -> String {
        let timezone = input
            .get("timezone")
            .and_then(Value::as_str)
            .unwrap_or("不明");
        format!("タイムゾーン: {}", timezone)
    }

    fn format_output(&self, output: &str) -> String {
        format!("現在時刻: {}", output)
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: "Current time in Tokyo".to_string(),
            parameters: json!({ "timezone": "Asia/Tokyo" }),
            expected_result: "A timestamp such as 2025-10-06 12:00:00".to_string(),
        }]
    }
}
