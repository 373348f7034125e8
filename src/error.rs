//! Error types for toolrelay.

use thiserror::Error;

/// Library-level error type for toolrelay operations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inference endpoint could not be reached, timed out, or returned
    /// a non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("A tool named '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Conversation error: {0}")]
    Conversation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures produced while dispatching a single tool call.
///
/// None of these abort the agent loop. The executor renders them with
/// `Display` and the text becomes the next tool turn, so the wording is
/// written for the model to read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Error: tool not found: '{name}'. Available tools: {available}")]
    NotFound { name: String, available: String },

    #[error("Error: invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Error: tool '{tool}' timed out after {timeout:?}")]
    Timeout {
        tool: String,
        timeout: std::time::Duration,
    },

    #[error("Error: tool '{0}' panicked during execution")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

/// Result type alias for toolrelay operations.
pub type Result<T> = std::result::Result<T, AgentError>;
