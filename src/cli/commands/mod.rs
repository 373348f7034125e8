//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod init;
mod tools;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use init::run_init;
pub use tools::run_tools;

use crate::agent::Agent;
use crate::config::{Prompts, Settings, ToolCallMode};
use crate::error::Result;
use crate::inference;
use crate::tools::builtin_registry;
use std::sync::Arc;

/// Apply `--model` / `--mode` flags on top of the loaded settings.
fn with_overrides(mut settings: Settings, model: Option<String>, mode: Option<ToolCallMode>) -> Settings {
    if let Some(model) = model {
        settings.model.model = model;
    }
    if let Some(mode) = mode {
        settings.agent.mode = mode;
    }
    settings
}

/// Build the agent and its prompts from settings.
fn build_agent(settings: &Settings) -> Result<(Agent, Prompts)> {
    let registry = Arc::new(builtin_registry(&settings.tools)?);
    let client = inference::create_client(&settings.model)?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    tracing::info!(
        "Using {} model {} in {} mode with {} tool(s)",
        client.provider(),
        settings.model.model,
        settings.agent.mode,
        registry.len()
    );

    Ok((Agent::from_settings(settings, client, registry), prompts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides() {
        let settings = with_overrides(Settings::default(), None, None);
        assert_eq!(settings.model.model, "llama3.1:8b");
        assert_eq!(settings.agent.mode, ToolCallMode::Structured);

        let settings = with_overrides(
            Settings::default(),
            Some("qwen2.5:7b".to_string()),
            Some(ToolCallMode::Auto),
        );
        assert_eq!(settings.model.model, "qwen2.5:7b");
        assert_eq!(settings.agent.mode, ToolCallMode::Auto);
    }

    #[test]
    fn test_build_agent_from_defaults() {
        let (agent, prompts) = build_agent(&Settings::default()).unwrap();
        let names: Vec<&str> = agent.catalog().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["calculator", "get_weather", "search"]);

        let conversation = agent.new_conversation(&prompts);
        assert_eq!(conversation.len(), 1);
        assert!(conversation.turns()[0].text.contains("- calculator:"));
    }
}
