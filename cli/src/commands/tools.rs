//! Tools listing command

use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use concierge_core::tools::ShimSignature;
use concierge_core::ConciergeSession;
use tracing::info;

/// Show registered tools and the parameters their shims accept
pub async fn tools_command(config_loader: CliConfigLoader) -> Result<()> {
    info!("Listing available tools");

    let config = config_loader.load().await?;
    let session = ConciergeSession::new(config).context("Failed to build tool registry")?;
    let registry = session.registry();

    println!("🛠️  Available Tools\n");

    for tool in registry.describe_all() {
        println!("📦 {}", tool.name);
        // Show first line of description only for brevity
        let first_line = tool.description.lines().next().unwrap_or_default();
        println!("   {}", first_line);

        if let Some(ShimSignature::Named(params)) = registry.shim(&tool.name).map(|s| s.signature()) {
            let names: Vec<String> = params
                .iter()
                .map(|p| {
                    if p.required {
                        p.name.clone()
                    } else {
                        format!("{}?", p.name)
                    }
                })
                .collect();
            println!("   params: {}", names.join(", "));
        }
        println!();
    }

    println!("💡 Run a tool directly with `concierge call <tool> --args '<json>'`");

    Ok(())
}
