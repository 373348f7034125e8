//! OpenAI-compatible chat completions backend.

use super::{arguments_to_map, ChatRequest, InferenceClient, ModelReply};
use crate::config::ModelSettings;
use crate::conversation::{Role, ToolCall, Turn};
use crate::error::{AgentError, Result};
use crate::openai::create_client;
use crate::tools::ToolDescriptor;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, instrument};

/// Client for OpenAI or any server exposing `/v1/chat/completions`.
pub struct OpenAiClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAiClient {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let client = create_client(
            Some(settings.base_url.as_str()),
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self { client })
    }
}

fn build_err(e: impl std::fmt::Display) -> AgentError {
    AgentError::OpenAI(format!("Failed to build request: {}", e))
}

/// Convert the transcript to chat completion messages.
///
/// Turns carry no call ids, so assistant calls get synthetic ids
/// `call_<turn>_<n>` and the tool turns that follow take them in order.
fn to_messages(turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages = Vec::with_capacity(turns.len());
    let mut pending_ids: VecDeque<String> = VecDeque::new();

    for (i, turn) in turns.iter().enumerate() {
        let message: ChatCompletionRequestMessage = match turn.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(turn.text.clone())
                .build()
                .map_err(build_err)?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.text.clone())
                .build()
                .map_err(build_err)?
                .into(),
            Role::Assistant => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !turn.text.is_empty() || turn.tool_calls.is_empty() {
                    args.content(turn.text.clone());
                }
                if !turn.tool_calls.is_empty() {
                    let calls: Vec<ChatCompletionMessageToolCall> = turn
                        .tool_calls
                        .iter()
                        .enumerate()
                        .map(|(n, call)| ChatCompletionMessageToolCall {
                            id: format!("call_{}_{}", i, n),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: Value::Object(call.arguments.clone()).to_string(),
                            },
                        })
                        .collect();
                    pending_ids = calls.iter().map(|c| c.id.clone()).collect();
                    args.tool_calls(calls);
                }
                args.build().map_err(build_err)?.into()
            }
            Role::Tool => {
                let id = pending_ids
                    .pop_front()
                    .unwrap_or_else(|| format!("call_{}", i));
                ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(id)
                    .content(turn.text.clone())
                    .build()
                    .map_err(build_err)?
                    .into()
            }
        };
        messages.push(message);
    }

    Ok(messages)
}

fn to_tools(catalog: &[ToolDescriptor]) -> Vec<ChatCompletionTool> {
    catalog
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.parameters_schema()),
                strict: None,
            },
        })
        .collect()
}

#[async_trait]
impl InferenceClient for OpenAiClient {
    #[instrument(skip(self, request), fields(model = request.model, messages = request.messages.len()))]
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply> {
        if request.stream {
            debug!("Streaming is not used with the OpenAI backend; sending a single request");
        }

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(request.model)
            .messages(to_messages(request.messages)?);
        if !request.tools.is_empty() {
            builder.tools(to_tools(request.tools));
        }
        let body = builder.build().map_err(build_err)?;

        let response = self
            .client
            .chat()
            .create(body)
            .await
            .map_err(|e| AgentError::Transport(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments =
                    arguments_to_map(&call.function.name, Value::String(call.function.arguments));
                ToolCall::new(call.function.name, arguments)
            })
            .collect();

        Ok(ModelReply {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn provider(&self) -> &str {
        "openai"
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .models()
            .list()
            .await
            .map(|_| ())
            .map_err(|e| AgentError::Transport(format!("Models API error: {}", e)))
    }
}
