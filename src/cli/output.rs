//! CLI output formatting utilities.

use crate::agent::{AgentEvent, ToolCallRecord};
use crate::tools::ToolDescriptor;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a tool catalog entry.
    pub fn tool_info(tool: &ToolDescriptor) {
        println!("  {} {}", style("*").cyan(), style(&tool.name).bold());
        println!("    {}", tool.description);
        for param in &tool.parameters {
            let required = if param.required { "required" } else { "optional" };
            println!(
                "    {} {} ({}, {}): {}",
                style("-").dim(),
                param.name,
                param.param_type,
                required,
                style(&param.description).dim()
            );
        }
    }

    /// Print live tool progress in the form `  [name] ✓`.
    pub fn tool_event(event: &AgentEvent) {
        match event {
            AgentEvent::ToolStarted { name, .. } => {
                print!("{}", style(format!("  [{}] ", name)).dim());
                std::io::stdout().flush().ok();
            }
            AgentEvent::ToolFinished {
                success, elapsed, ..
            } => {
                let mark = if *success {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                println!("{} {}", mark, style(format!("{:.1}s", elapsed.as_secs_f64())).dim());
            }
        }
    }

    /// Print a summary line per tool call.
    pub fn tool_calls(calls: &[ToolCallRecord]) {
        Output::header(&format!("Tool calls ({})", calls.len()));
        for call in calls {
            println!(
                "  {} {} {} {}",
                style("*").cyan(),
                preview(&call.to_string(), 60),
                style("->").dim(),
                preview(&call.result, 60)
            );
        }
        println!();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Single-line preview truncated to `max_chars` characters.
pub fn preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let cut: String = content.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("line one\nline two", 40), "line one line two");
        assert_eq!(preview("abcdefghij", 8), "abcde...");
        // Multi-byte characters are never split.
        assert_eq!(preview("Zürich: 3.0°C, wind 9.0 km/h", 10), "Zürich:...");
    }
}
