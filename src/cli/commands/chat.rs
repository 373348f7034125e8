//! Interactive chat command with tool calling support.

use super::{build_agent, with_overrides};
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{Settings, ToolCallMode};
use crate::conversation::Conversation;
use anyhow::Result;
use chrono::Local;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// What a line of user input asks the session to do.
#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Quit,
    Clear,
    Save,
    Message(&'a str),
    Empty,
}

fn classify(input: &str) -> ChatCommand<'_> {
    let input = input.trim();
    if input.is_empty() {
        ChatCommand::Empty
    } else if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
        ChatCommand::Quit
    } else if input.eq_ignore_ascii_case("clear") {
        ChatCommand::Clear
    } else if input.eq_ignore_ascii_case("save") {
        ChatCommand::Save
    } else {
        ChatCommand::Message(input)
    }
}

/// File name for a saved transcript: local timestamp plus session id.
fn transcript_path(dir: &Path, conversation: &Conversation) -> PathBuf {
    dir.join(format!(
        "{}_{}.json",
        Local::now().format("%Y%m%d-%H%M%S"),
        conversation.id()
    ))
}

/// Run the interactive chat command.
pub async fn run_chat(
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
    let agent = agent.with_observer(Output::tool_event);
    let mut conversation = agent.new_conversation(&prompts);

    println!("\n{}", style("toolrelay chat").bold().cyan());
    println!(
        "{}",
        style(format!("{} ({} mode)", agent.model(), agent.mode())).dim()
    );
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset, 'save' to keep the transcript.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        match classify(&input) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => {
                Output::info("Goodbye!");
                break;
            }
            ChatCommand::Clear => {
                conversation = agent.new_conversation(&prompts);
                Output::info("Conversation history cleared.");
            }
            ChatCommand::Save => {
                let path = transcript_path(&settings.transcripts_dir(), &conversation);
                match conversation.save_to(&path) {
                    Ok(()) => Output::success(&format!("Transcript saved to {}", path.display())),
                    Err(e) => Output::error(&format!("Failed to save transcript: {}", e)),
                }
            }
            ChatCommand::Message(message) => match agent.run_turn(&mut conversation, message).await {
                Ok(response) => {
                    println!("\n{} {}\n", style("Assistant:").cyan().bold(), response.content);
                    if response.truncated {
                        Output::warning(&format!(
                            "Stopped after {} tool round(s); the answer may be incomplete.",
                            response.rounds
                        ));
                    }
                }
                Err(e) => {
                    Output::error(&format!("Error: {}", e));
                }
            },
        }
    }

    Ok(())
}
