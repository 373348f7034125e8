//! Inference endpoint abstraction.
//!
//! The agent loop only sees [`InferenceClient`]: send the transcript and
//! the tool catalog, get back the assistant text plus any native tool
//! calls. Wire formats live in the backend modules.

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::config::{ModelProvider, ModelSettings};
use crate::conversation::{ToolCall, Turn};
use crate::error::Result;
use crate::tools::ToolDescriptor;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

/// One model request.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Turn],
    /// Tool catalog. Empty when tools are advertised in the prompt instead.
    pub tools: &'a [ToolDescriptor],
    pub stream: bool,
}

/// The model's answer to one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    /// Native tool calls, in the order the model emitted them.
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Trait for chat endpoints that may return tool calls.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send the conversation and return the complete reply.
    ///
    /// Unreachable endpoints, timeouts and non-success statuses are
    /// reported as [`crate::error::AgentError::Transport`].
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply>;

    /// Backend name for logs and diagnostics.
    fn provider(&self) -> &str;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<()>;
}

/// Create the client configured in `settings`.
pub fn create_client(settings: &ModelSettings) -> Result<Arc<dyn InferenceClient>> {
    let client: Arc<dyn InferenceClient> = match settings.provider {
        ModelProvider::Ollama => Arc::new(OllamaClient::new(settings)?),
        ModelProvider::OpenAI => Arc::new(OpenAiClient::new(settings)?),
    };
    Ok(client)
}

/// Normalize tool-call arguments to a map.
///
/// Endpoints send either a JSON object or a string containing one. Anything
/// else is logged and replaced by an empty map, which the executor then
/// reports as missing arguments.
pub(crate) fn arguments_to_map(tool: &str, arguments: Value) -> Map<String, Value> {
    match arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        Value::String(raw) if raw.trim().is_empty() => Map::new(),
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!("Unparseable arguments for tool {}: {}", tool, raw);
                Map::new()
            }
        },
        other => {
            warn!("Unexpected arguments for tool {}: {}", tool, other);
            Map::new()
        }
    }
}
