//! Pre-flight checks before talking to the model.
//!
//! Validates configuration that would otherwise make the first model
//! request fail after the session has started.

use crate::config::{ModelProvider, ModelSettings, Settings};
use crate::error::{AgentError, Result};

/// Run pre-flight checks for a chat or ask session.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    if settings.model.model.trim().is_empty() {
        return Err(AgentError::Config(
            "No model configured. Set model.model in the config file or pass --model".to_string(),
        ));
    }

    if needs_api_key(&settings.model) {
        check_api_key()?;
    }

    if settings.tools.enabled.is_empty() {
        tracing::warn!("No tools enabled; the model can only answer from its own knowledge");
    }

    Ok(())
}

/// Only the hosted OpenAI API insists on a key; local OpenAI-compatible
/// servers configured through `base_url` usually accept anything.
pub fn needs_api_key(model: &ModelSettings) -> bool {
    model.provider == ModelProvider::OpenAI && model.base_url.trim().is_empty()
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(AgentError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(AgentError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
