//! SQL search tools over the concierge CSV data sources

use crate::config::ConciergeConfig;
use crate::error::ToolError;
use crate::sandbox::SqlSandbox;
use crate::tools::{Tool, ToolExample};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

const EVENT_COLUMNS: &[(&str, &str)] = &[
    ("event_name", "event or limited-edition product name"),
    ("description", "event or product description"),
    ("date_time", "date or period (YYYY-MM-DD or \"start/end\")"),
    ("location", "venue as JSON: {\"venue\": ..., \"address\": ...}"),
    ("capacity", "capacity"),
    ("source_url", "source URL"),
    ("extracted_at", "extraction timestamp"),
    ("additional_info", "additional information"),
    ("contact_info", "contact as JSON: {\"phone\": ..., \"email\": ...}"),
    ("cost", "cost as JSON: {\"is_free\": true/false, \"amount\": ..., \"notes\": ...}"),
    ("registration_required", "\"True\" or empty"),
    ("target_audience", "JSON array, e.g. [\"family\", \"kids\"]"),
];

const STORE_COLUMNS: &[(&str, &str)] = &[
    ("store_id", "store id, e.g. \"STR-0001\""),
    ("store_name", "store name"),
    ("description", "store description"),
    ("category", "category such as \"retail\", \"restaurant\", \"cafe\""),
    ("opening_hours", "JSON: {\"monday\": [{\"open\": \"10:00\", \"close\": \"20:00\"}], ...}"),
    ("irregular_closures", "JSON array of temporary closures"),
    ("phone", "phone number"),
    ("email", "email address"),
    ("address", "address"),
    ("Biz_Entertainment_Available", "\"TRUE\" or empty"),
    ("private_room", "JSON: {\"available\": bool, \"capacity\": n, \"charge\": ...}"),
    ("pets_allowed", "\"TRUE\" or empty"),
    ("target_audience", "JSON array of audiences"),
    ("menu", "menu information"),
    ("seasonal_items", "seasonal items"),
    ("allergy_info", "allergy information"),
    ("kids_info", "JSON: {\"kids_menu\": bool, \"highchair\": bool, \"diaper_changing\": bool}"),
    ("reservations", "reservation information"),
    ("accessibility", "accessibility information"),
    ("parking", "JSON: {\"available\": bool, \"capacity\": n, \"charge\": ...}"),
    ("access_route", "how to get there"),
];

const PRODUCT_COLUMNS: &[(&str, &str)] = &[
    ("store_name", "store name"),
    ("product_name", "product name"),
    ("product_description", "product description including price"),
    ("tag", "category tag (food, gift, ...)"),
];

/// Runs model-authored SELECT statements against one data source
pub struct SqlSearchTool {
    name: String,
    description: String,
    table: String,
    sandbox: SqlSandbox,
}

impl SqlSearchTool {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D, sandbox: SqlSandbox) -> Self {
        let table = sandbox
            .tables()
            .first()
            .map(|binding| binding.virtual_name.clone())
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.into(),
            table,
            sandbox,
        }
    }

    /// `search_events` over the events source
    pub fn events(config: &ConciergeConfig) -> Self {
        let table = &config.events.virtual_name;
        let description = describe(
            "search_events",
            "Search events and limited-time products with a SQL query.",
            table,
            EVENT_COLUMNS,
            &[
                format!("SELECT * FROM '{}' WHERE event_name LIKE '%BMW%'", table),
                format!("SELECT * FROM '{}' WHERE cost LIKE '%\"is_free\": true%'", table),
                format!(
                    "SELECT event_name, date_time, location FROM '{}' WHERE date_time LIKE '2025-10%' ORDER BY date_time",
                    table
                ),
            ],
        );
        Self::new(
            "search_events",
            description,
            SqlSandbox::for_source(config, &config.events),
        )
    }

    /// `search_stores` over the stores source
    pub fn stores(config: &ConciergeConfig) -> Self {
        let table = &config.stores.virtual_name;
        let description = describe(
            "search_stores",
            "Search stores, restaurants and cafes with a SQL query.",
            table,
            STORE_COLUMNS,
            &[
                format!("SELECT * FROM '{}' WHERE category = 'restaurant'", table),
                format!(
                    "SELECT store_name, address, parking FROM '{}' WHERE parking LIKE '%\"available\": true%'",
                    table
                ),
                format!("SELECT * FROM '{}' WHERE pets_allowed = 'TRUE'", table),
            ],
        );
        Self::new(
            "search_stores",
            description,
            SqlSandbox::for_source(config, &config.stores),
        )
    }

    /// `search_products` over the products source
    pub fn products(config: &ConciergeConfig) -> Self {
        let table = &config.products.virtual_name;
        let description = describe(
            "search_products",
            "Search regular products, menus and gifts with a SQL query. \
             Use search_events for limited-time products.",
            table,
            PRODUCT_COLUMNS,
            &[
                format!("SELECT * FROM '{}' WHERE tag = 'gift'", table),
                format!(
                    "SELECT product_name, product_description FROM '{}' WHERE store_name LIKE '%Market%'",
                    table
                ),
            ],
        );
        Self::new(
            "search_products",
            description,
            SqlSandbox::for_source(config, &config.products),
        )
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn describe(
    name: &str,
    summary: &str,
    table: &str,
    columns: &[(&str, &str)],
    examples: &[String],
) -> String {
    let mut text = format!(
        "{}: {}\n\n\
         Usage:\n\
         - Use '{}' in the FROM clause\n\
         - Only SELECT statements are allowed\n\
         - At most 10 rows are returned; LIMIT 10 is added when missing and larger limits are lowered\n\n\
         Columns (all TEXT):\n",
        name, summary, table
    );

    for (column, meaning) in columns {
        text.push_str(&format!("- {}: {}\n", column, meaning));
    }

    text.push_str("\nExamples:\n");
    for (i, example) in examples.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, example));
    }
    text
}

#[async_trait]
impl Tool for SqlSearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sql_query": {
                    "type": "string",
                    "description": format!("SELECT statement reading from '{}'", self.table)
                }
            },
            "required": ["sql_query"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let sql = args
            .get("sql_query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        debug!("{} executing: {}", self.name, sql);

        let sandbox = self.sandbox.clone();
        let output = tokio::task::spawn_blocking(move || sandbox.run(&sql))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: self.name.clone(),
                message: e.to_string(),
            })??;

        Ok(output.to_wire())
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample {
            description: format!("Fetch a few rows from {}", self.table),
            parameters: json!({ "sql_query": format!("SELECT * FROM '{}' LIMIT 3", self.table) }),
            expected_result: "Up to three rows with their column values".to_string(),
        }]
    }
}
