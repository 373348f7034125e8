//! Prompt templates for toolrelay.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom
//! prompts directory.

use crate::config::ToolCallMode;
use crate::tools::ToolDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// System prompts for the agent loop, one per tool-call mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// Used when the endpoint returns native tool calls.
    pub structured: String,
    /// Used when the model must write `TOOL:` / `INPUT:` directives.
    pub text: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            structured: r#"You are a helpful assistant with tools:
{{tools}}

Use the right tool when needed. Do not guess answers.
When a tool returns an error, correct your arguments or explain the problem to the user."#
                .to_string(),

            text: r#"You are a helpful assistant with access to these tools:
{{tools}}

To use a tool, reply with exactly two lines and nothing else:
TOOL: <tool name>
INPUT: <input for the tool>

You will then receive the tool result and can continue.
When you can answer without a tool, reply with the final answer only and do not write TOOL or INPUT lines.
Do not guess answers to questions a tool can answer."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// System prompt for `mode`, with the tool catalog filled in.
    pub fn system_prompt(&self, mode: ToolCallMode, catalog: &[ToolDescriptor]) -> String {
        let template = match mode {
            ToolCallMode::Structured => &self.agent.structured,
            ToolCallMode::Text | ToolCallMode::Auto => &self.agent.text,
        };

        let mut vars = HashMap::new();
        vars.insert("tools".to_string(), format_catalog(catalog));
        self.render_with_custom(template, &vars)
    }
}

/// One line per tool: `- name: description (input: param)`.
fn format_catalog(catalog: &[ToolDescriptor]) -> String {
    catalog
        .iter()
        .map(|tool| match tool.primary_param() {
            Some(param) => format!("- {}: {} (input: {})", tool.name, tool.description, param),
            None => format!("- {}: {}", tool.name, tool.description),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParamSpec;

    fn catalog() -> Vec<ToolDescriptor> {
        vec![ToolDescriptor {
            name: "calculator".to_string(),
            description: "Does math.".to_string(),
            parameters: vec![ParamSpec::required_string("expression", "Math")],
        }]
    }

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.agent.structured.contains("{{tools}}"));
        assert!(prompts.agent.text.contains("TOOL: <tool name>"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let prompts = Prompts::default();
        let prompt = prompts.system_prompt(ToolCallMode::Text, &catalog());
        assert!(prompt.contains("- calculator: Does math. (input: expression)"));
        assert!(!prompt.contains("{{tools}}"));
    }

    #[test]
    fn test_custom_variables_are_rendered() {
        let mut vars = HashMap::new();
        vars.insert("persona".to_string(), "a pirate".to_string());

        let mut prompts = Prompts::load(None, Some(&vars)).unwrap();
        prompts.agent.structured = "You are {{persona}}.\n{{tools}}".to_string();

        let prompt = prompts.system_prompt(ToolCallMode::Structured, &catalog());
        assert!(prompt.starts_with("You are a pirate."));
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agent.toml"),
            "structured = \"Custom {{tools}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.agent.structured, "Custom {{tools}}");
        // Missing keys fall back to defaults.
        assert!(prompts.agent.text.contains("INPUT:"));
    }
}
