//! Doctor command - verify configuration, model endpoint and tools.

use crate::cli::preflight::needs_api_key;
use crate::cli::Output;
use crate::config::{ModelProvider, Settings};
use crate::inference;
use crate::tools::builtin_registry;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a section and collect its results.
fn section(title: &str, results: Vec<CheckResult>, checks: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &results {
        check.print();
    }
    println!();
    checks.extend(results);
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("toolrelay doctor");
    println!();
    println!("Checking configuration, model endpoint and tools...\n");

    let mut checks = Vec::new();

    section("Configuration", vec![check_config_file(config_path)], &mut checks);

    let mut model_checks = vec![check_api_key(settings)];
    model_checks.push(check_endpoint(settings).await);
    section("Model", model_checks, &mut checks);

    section("Tools", check_tools(settings), &mut checks);

    section("Directories", check_directories(settings), &mut checks);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using toolrelay.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! toolrelay is ready to use.");
    }

    Ok(())
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: toolrelay init (or toolrelay config edit)",
        )
    }
}

/// Check the OpenAI key when the hosted API is configured.
fn check_api_key(settings: &Settings) -> CheckResult {
    if !needs_api_key(&settings.model) {
        return CheckResult::ok(
            "API key",
            &format!("not required for {}", endpoint_label(settings)),
        );
    }
    classify_api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())
}

fn classify_api_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Some("") => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn endpoint_label(settings: &Settings) -> String {
    if settings.model.base_url.trim().is_empty() {
        format!("{} (default endpoint)", settings.model.provider)
    } else {
        format!("{} at {}", settings.model.provider, settings.model.base_url)
    }
}

/// Check that the model endpoint answers.
async fn check_endpoint(settings: &Settings) -> CheckResult {
    let hint = match settings.model.provider {
        ModelProvider::Ollama => format!(
            "Start Ollama with: ollama serve (then: ollama pull {})",
            settings.model.model
        ),
        ModelProvider::OpenAI => "Check model.base_url and your network connection".to_string(),
    };

    let client = match inference::create_client(&settings.model) {
        Ok(client) => client,
        Err(e) => return CheckResult::error("Endpoint", &e.to_string(), &hint),
    };

    match client.ping().await {
        Ok(()) => CheckResult::ok(
            "Endpoint",
            &format!("{} reachable (model {})", endpoint_label(settings), settings.model.model),
        ),
        Err(e) => CheckResult::error("Endpoint", &format!("unreachable: {}", e), &hint),
    }
}

/// Check that every enabled tool has a handler.
fn check_tools(settings: &Settings) -> Vec<CheckResult> {
    match builtin_registry(&settings.tools) {
        Ok(registry) if registry.is_empty() => vec![CheckResult::warning(
            "Tools",
            "none enabled",
            "Add calculator, get_weather or search to tools.enabled",
        )],
        Ok(registry) => registry
            .list()
            .iter()
            .map(|tool| CheckResult::ok(&tool.name, "enabled"))
            .collect(),
        Err(e) => vec![CheckResult::error(
            "Tools",
            &e.to_string(),
            "Fix tools.enabled in the config file",
        )],
    }
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let transcripts = settings.transcripts_dir();
    let saved = std::fs::read_dir(&transcripts)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                .count()
        })
        .unwrap_or(0);
    results.push(CheckResult::ok(
        "Transcripts",
        &format!("{} ({} saved)", transcripts.display(), saved),
    ));

    results
}
