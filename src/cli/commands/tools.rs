//! Tools command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::tools::{builtin_registry, ToolDescriptor};
use anyhow::Result;
use serde_json::Value;

/// Function-calling schema for every tool, as sent to the model.
fn catalog_json(catalog: &[ToolDescriptor]) -> Result<String> {
    let schemas: Vec<Value> = catalog.iter().map(|t| t.to_function_schema()).collect();
    Ok(serde_json::to_string_pretty(&schemas)?)
}

/// Run the tools command.
pub fn run_tools(json: bool, settings: &Settings) -> Result<()> {
    let registry = builtin_registry(&settings.tools)?;
    let catalog = registry.list();

    if json {
        println!("{}", catalog_json(&catalog)?);
        return Ok(());
    }

    if catalog.is_empty() {
        Output::info("No tools enabled. Add tool names to tools.enabled in the config file.");
        return Ok(());
    }

    Output::header(&format!("Available Tools ({})", catalog.len()));
    println!();
    for tool in &catalog {
        Output::tool_info(tool);
    }
    println!();

    Ok(())
}
