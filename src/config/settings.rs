//! Configuration settings for toolrelay.

use crate::tools::BUILTIN_TOOLS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub tools: ToolSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for saved transcripts.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.toolrelay".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Inference backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Ollama native `/api/chat` (default).
    #[default]
    Ollama,
    /// Any OpenAI-compatible chat completions endpoint.
    OpenAI,
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(ModelProvider::Ollama),
            "openai" => Ok(ModelProvider::OpenAI),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::Ollama => write!(f, "ollama"),
            ModelProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Inference endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    /// Model name passed to the endpoint.
    pub model: String,
    /// Base URL. For the OpenAI provider an empty value means the public API.
    pub base_url: String,
    /// Request a streamed response (Ollama only).
    pub stream: bool,
    /// Timeout for a single model request, in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Ollama,
            model: "llama3.1:8b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            stream: false,
            timeout_secs: 300,
        }
    }
}

/// How tool calls are obtained from model output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallMode {
    /// Native tool calls returned by the endpoint.
    #[default]
    Structured,
    /// `TOOL:` / `INPUT:` directives in free text.
    Text,
    /// Native calls when present, free text otherwise.
    Auto,
}

impl std::str::FromStr for ToolCallMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structured" | "native" => Ok(ToolCallMode::Structured),
            "text" | "react" => Ok(ToolCallMode::Text),
            "auto" => Ok(ToolCallMode::Auto),
            _ => Err(format!("Unknown tool call mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ToolCallMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCallMode::Structured => write!(f, "structured"),
            ToolCallMode::Text => write!(f, "text"),
            ToolCallMode::Auto => write!(f, "auto"),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub mode: ToolCallMode,
    /// Maximum tool-call batches per user turn.
    pub max_tool_rounds: usize,
    /// Timeout for a single tool call, in seconds.
    pub tool_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            mode: ToolCallMode::Structured,
            max_tool_rounds: 8,
            tool_timeout_secs: 30,
        }
    }
}

/// Built-in tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Tools to register, in catalog order.
    pub enabled: Vec<String>,
    /// User-Agent sent with every tool request.
    pub user_agent: String,
    /// Timeout for each tool HTTP request, in seconds.
    pub http_timeout_secs: u64,
    pub geocoding_url: String,
    pub forecast_url: String,
    pub search_url: String,
    /// Base URL of the page summary endpoint; the title is appended.
    pub summary_url: String,
    /// Summaries longer than this many characters are truncated.
    pub summary_max_chars: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            enabled: BUILTIN_TOOLS.iter().map(|s| s.to_string()).collect(),
            user_agent: concat!("toolrelay/", env!("CARGO_PKG_VERSION")).to_string(),
            http_timeout_secs: 15,
            geocoding_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            search_url: "https://en.wikipedia.org/w/api.php".to_string(),
            summary_url: "https://en.wikipedia.org/api/rest_v1/page/summary/".to_string(),
            summary_max_chars: 500,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AgentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("toolrelay")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory where chat transcripts are saved.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }
}
