//! Ask command implementation.

use super::{build_agent, with_overrides};
use crate::agent::AgentEvent;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{Settings, ToolCallMode};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    mode: Option<ToolCallMode>,
    settings: Settings,
) -> Result<()> {
    let settings = with_overrides(settings, model, mode);

    // Pre-flight checks
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'toolrelay doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let (agent, prompts) = build_agent(&settings)?;
    let mut conversation = agent.new_conversation(&prompts);

    let spinner = Output::spinner("Thinking...");
    let progress = spinner.clone();
    let agent = agent.with_observer(move |event| {
        if let AgentEvent::ToolStarted { name, .. } = event {
            progress.set_message(format!("Running {}...", name));
        }
    });

    match agent.run_turn(&mut conversation, question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.content);

            if !response.tool_calls.is_empty() {
                Output::tool_calls(&response.tool_calls);
            }

            if response.truncated {
                Output::warning(&format!(
                    "Stopped after {} tool round(s); the answer may be incomplete.",
                    response.rounds
                ));
            } else {
                Output::info(&format!(
                    "Completed with {} model call(s) and {} tool round(s)",
                    response.model_calls, response.rounds
                ));
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
