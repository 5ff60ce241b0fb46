//! Single tool call command

use crate::config::CliConfigLoader;
use crate::output::EventFormatter;
use anyhow::{anyhow, Context, Result};
use concierge_core::tools::pretty_json;
use concierge_core::{ConciergeSession, ToolCall};
use serde_json::{Map, Value};
use tracing::info;

/// Dispatch one call through the tool's shim and print its wire JSON
pub async fn call_command(
    config_loader: CliConfigLoader,
    tool_name: String,
    args: Option<String>,
) -> Result<()> {
    let config = config_loader.load().await?;
    let session = ConciergeSession::new(config).context("Failed to build tool registry")?;

    let parameters = parse_args(args.as_deref())?;
    let call = ToolCall::new(tool_name, parameters);
    info!("Calling {} ({})", call.name, call.id);

    let result = session.call_tool(&call).await;

    let formatter = EventFormatter::new();
    let input = session.registry().format_input(&call.name, &call.parameters);
    eprintln!(
        "{}",
        formatter.format_tool_result(&call.name, &input, "", result.success)
    );
    println!("{}", pretty_json(&result.data));

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

/// `--args` must be a JSON object; absent means no arguments
fn parse_args(args: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = args else {
        return Ok(Map::new());
    };

    match serde_json::from_str(raw).context("Failed to parse --args as JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("--args must be a JSON object, got: {}", other)),
    }
}
