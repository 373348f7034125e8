//! OpenAI client configuration.

use crate::error::{AgentError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client with an optional API base and a request timeout.
///
/// The API key comes from `OPENAI_API_KEY`. An empty `api_base` means the
/// public OpenAI API; local OpenAI-compatible servers usually accept any key.
pub fn create_client(api_base: Option<&str>, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::default();
    if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
