//! Scoped execution of validated queries against CSV-backed virtual tables

use super::validate;
use crate::config::{ConciergeConfig, DataSource, SandboxConfig};
use crate::error::{SandboxError, ValidationError};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::{vtab::csvtab, Connection, Params};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Message attached to an empty result set
pub const NO_RESULTS_MESSAGE: &str = "No rows matched the query conditions";

/// A logical table name bound to the CSV file that backs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBinding {
    pub virtual_name: String,
    pub path: PathBuf,
}

/// Rows produced by a sandboxed query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub results: Vec<Map<String, Value>>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QueryOutput {
    fn from_rows(results: Vec<Map<String, Value>>) -> Self {
        let count = results.len();
        let message = (count == 0).then(|| NO_RESULTS_MESSAGE.to_string());
        Self {
            results,
            count,
            message,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The `{"results": [...], "count": n}` shape returned by SQL tools
    pub fn to_wire(&self) -> Value {
        let mut wire = json!({
            "results": self.results,
            "count": self.count,
        });
        if let (Some(message), Some(object)) = (&self.message, wire.as_object_mut()) {
            object.insert("message".to_string(), Value::String(message.clone()));
        }
        wire
    }
}

/// Read-only query boundary shared by the data lookup tools.
///
/// Every execution opens its own in-memory connection, registers the bound
/// CSV files as virtual tables under their logical names, and drops the
/// connection before returning.
#[derive(Debug, Clone)]
pub struct SqlSandbox {
    tables: Vec<TableBinding>,
    max_rows: usize,
}

impl SqlSandbox {
    /// Create a sandbox with no tables bound
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            tables: Vec::new(),
            max_rows: config.max_rows,
        }
    }

    /// Create a sandbox bound to a single configured data source
    pub fn for_source(config: &ConciergeConfig, source: &DataSource) -> Self {
        Self::new(&config.sandbox).bind_table(&source.virtual_name, config.resolve(source))
    }

    /// Bind `virtual_name` to the CSV file at `path`
    pub fn bind_table<S: Into<String>, P: Into<PathBuf>>(mut self, virtual_name: S, path: P) -> Self {
        self.tables.push(TableBinding {
            virtual_name: virtual_name.into(),
            path: path.into(),
        });
        self
    }

    pub fn tables(&self) -> &[TableBinding] {
        &self.tables
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn validate(&self, sql: &str) -> Result<(), ValidationError> {
        validate::validate(sql)
    }

    pub fn enforce_limit(&self, sql: &str) -> String {
        validate::enforce_limit(sql, self.max_rows)
    }

    /// Validate, bound and execute a model-authored query
    pub fn run(&self, sql: &str) -> Result<QueryOutput, SandboxError> {
        if let Err(err) = self.validate(sql) {
            warn!("Invalid SQL query: {}", err);
            return Err(err.into());
        }

        let limited = self.enforce_limit(sql);
        self.execute(&limited)
    }

    /// Execute an already validated query
    pub fn execute(&self, sql: &str) -> Result<QueryOutput, SandboxError> {
        self.execute_with_params(sql, [])
    }

    /// Execute a query with bound parameters.
    ///
    /// Used by lookup tools whose SQL is fixed and whose user input only
    /// ever reaches the engine as a parameter.
    pub fn execute_with_params<P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<QueryOutput, SandboxError> {
        let conn = self.open_connection()?;
        let mut stmt = conn.prepare(sql)?;

        if !stmt.readonly() {
            return Err(SandboxError::execution(
                "Statement would modify the database",
            ));
        }

        let columns: Vec<(String, Option<String>)> = stmt
            .columns()
            .iter()
            .map(|column| {
                (
                    column.name().to_string(),
                    column.decl_type().map(|t| t.to_ascii_uppercase()),
                )
            })
            .collect();

        let mut rows = stmt.query(params)?;
        let mut results = Vec::new();

        while let Some(row) = rows.next()? {
            if results.len() >= self.max_rows {
                debug!("Row cap of {} reached, dropping remaining rows", self.max_rows);
                break;
            }

            let mut record = Map::new();
            for (index, (name, decl_type)) in columns.iter().enumerate() {
                let value = row.get_ref(index)?;
                record.insert(name.clone(), to_json(value, decl_type.as_deref()));
            }
            results.push(record);
        }

        info!("Query executed successfully: {} results found", results.len());
        Ok(QueryOutput::from_rows(results))
    }

    fn open_connection(&self) -> Result<Connection, SandboxError> {
        let conn = Connection::open_in_memory()?;
        csvtab::load_module(&conn)?;

        for table in &self.tables {
            if !table.path.is_file() {
                return Err(SandboxError::execution(format!(
                    "Data file for '{}' not found: {}",
                    table.virtual_name,
                    table.path.display()
                )));
            }

            let ddl = format!(
                "CREATE VIRTUAL TABLE {} USING csv(filename={}, header=yes)",
                quote_identifier(&table.virtual_name),
                quote_literal(&table.path.to_string_lossy()),
            );
            conn.execute_batch(&ddl)?;
        }

        Ok(conn)
    }
}

pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn is_temporal(decl_type: Option<&str>) -> bool {
    matches!(decl_type, Some(t) if t.contains("DATE") || t.contains("TIME"))
}

/// SQLite's `YYYY-MM-DD HH:MM:SS[.fff]` text rendered as ISO-8601
fn iso_datetime(text: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn to_json(value: ValueRef<'_>, decl_type: Option<&str>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if is_temporal(decl_type) => DateTime::from_timestamp(i, 0)
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or_else(|| Value::from(i)),
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            Value::String(iso_datetime(&text).unwrap_or_else(|| text.into_owned()))
        }
        ValueRef::Blob(bytes) => Value::String(BASE64_STANDARD.encode(bytes)),
    }
}
