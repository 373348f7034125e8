//! Init command - interactive first-run setup.

use crate::cli::preflight::needs_api_key;
use crate::cli::Output;
use crate::config::{ModelProvider, Settings};
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("toolrelay setup");
    println!();
    println!("Welcome to toolrelay! Let's make sure everything is configured correctly.\n");

    // Step 1: Model endpoint
    println!("{}", style("Step 1: Model endpoint").bold().cyan());
    println!();

    match settings.model.provider {
        ModelProvider::Ollama => {
            Output::info(&format!(
                "Using Ollama at {} with model {}.",
                settings.model.base_url, settings.model.model
            ));
            println!();
            println!("  Make sure Ollama is running and the model is available:");
            println!("  {}", style(format!("ollama pull {}", settings.model.model)).green());
        }
        ModelProvider::OpenAI if needs_api_key(&settings.model) => {
            if std::env::var("OPENAI_API_KEY").is_err() {
                Output::warning("OPENAI_API_KEY environment variable is not set.");
                println!();
                println!(
                    "  Get your API key from: {}",
                    style("https://platform.openai.com/api-keys").underlined()
                );
                println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
                println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
                println!();

                if !prompt_continue("Continue without API key?")? {
                    println!();
                    Output::info("Setup cancelled. Set your API key and run 'toolrelay init' again.");
                    return Ok(());
                }
            } else {
                Output::success("OpenAI API key is configured!");
            }
        }
        ModelProvider::OpenAI => {
            Output::info(&format!(
                "Using OpenAI-compatible server at {}.",
                settings.model.base_url
            ));
        }
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    for dir in [settings.data_dir(), settings.transcripts_dir()] {
        if dir.exists() {
            Output::info(&format!("Directory exists: {}", dir.display()));
        } else {
            std::fs::create_dir_all(&dir)?;
            Output::success(&format!("Created directory: {}", dir.display()));
        }
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path.to_path_buf())?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("toolrelay config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("toolrelay doctor").cyan());
    println!("  {} See what the model can call", style("toolrelay tools").cyan());
    println!("  {} Ask a question", style("toolrelay ask \"What is 25 * 5?\"").cyan());
    println!("  {} Start a conversation", style("toolrelay chat").cyan());
    println!();
    println!("For more help: {}", style("toolrelay --help").cyan());

    Ok(())
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }
}
