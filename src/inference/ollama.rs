//! Ollama `/api/chat` client with tool calling and NDJSON streaming.

use super::{arguments_to_map, ChatRequest, InferenceClient, ModelReply};
use crate::config::ModelSettings;
use crate::conversation::{ToolCall, Turn};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Client for a local or remote Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// A full response, or one line of a streamed response.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl From<&Turn> for WireMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.to_string(),
            content: turn.text.clone(),
            tool_calls: turn
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    function: WireFunction {
                        name: call.name.clone(),
                        arguments: Value::Object(call.arguments.clone()),
                    },
                })
                .collect(),
            tool_name: turn.tool_name.clone(),
        }
    }
}

/// Folds response lines into one reply.
#[derive(Debug, Default)]
struct ReplyAccumulator {
    reply: ModelReply,
    done: bool,
}

impl ReplyAccumulator {
    /// Consume one JSON line. Returns `true` once the done marker is seen.
    fn push_line(&mut self, line: &[u8]) -> Result<bool> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(self.done);
        }

        let chunk: WireResponse = serde_json::from_slice(line)
            .map_err(|e| AgentError::InvalidResponse(format!("malformed chunk: {}", e)))?;

        if let Some(error) = chunk.error {
            return Err(AgentError::Transport(format!("Ollama error: {}", error)));
        }

        if let Some(message) = chunk.message {
            self.reply.text.push_str(&message.content);
            self.reply
                .tool_calls
                .extend(message.tool_calls.into_iter().map(|call| {
                    let arguments = arguments_to_map(&call.function.name, call.function.arguments);
                    ToolCall::new(call.function.name, arguments)
                }));
        }

        self.done |= chunk.done;
        Ok(self.done)
    }

    fn finish(self) -> ModelReply {
        if !self.done {
            warn!("Response ended without a done marker");
        }
        self.reply
    }
}

impl OllamaClient {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn send(&self, path: &str, body: Option<&WireRequest<'_>>) -> Result<reqwest::Response> {
        let endpoint = format!("{}{}", self.base_url, path);
        let request = match body {
            Some(body) => self.client.post(&endpoint).json(body),
            None => self.client.get(&endpoint),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Transport(format!("request to {} timed out", endpoint))
            } else {
                AgentError::Transport(format!("request to {} failed: {}", endpoint, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Transport(format!(
                "{} returned HTTP {}: {}",
                endpoint,
                status,
                body.trim()
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    #[instrument(skip(self, request), fields(model = request.model, messages = request.messages.len()))]
    async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply> {
        let body = WireRequest {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            stream: request.stream,
            tools: request.tools.iter().map(|t| t.to_function_schema()).collect(),
        };

        let response = self.send("/api/chat", Some(&body)).await?;
        let mut acc = ReplyAccumulator::default();

        if request.stream {
            let mut bytes_stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            'read: while let Some(chunk) = bytes_stream.next().await {
                let bytes =
                    chunk.map_err(|e| AgentError::Transport(format!("stream interrupted: {}", e)))?;
                buffer.extend_from_slice(&bytes);

                while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    if acc.push_line(&line)? {
                        break 'read;
                    }
                }
            }

            if !acc.done && !buffer.is_empty() {
                acc.push_line(&buffer)?;
            }
        } else {
            let body = response
                .bytes()
                .await
                .map_err(|e| AgentError::Transport(format!("failed to read response: {}", e)))?;
            acc.push_line(&body)?;
            if acc.reply.text.is_empty() && acc.reply.tool_calls.is_empty() && !acc.done {
                return Err(AgentError::InvalidResponse("empty response".to_string()));
            }
        }

        let reply = acc.finish();
        debug!(
            "Ollama replied with {} chars and {} tool call(s)",
            reply.text.len(),
            reply.tool_calls.len()
        );
        Ok(reply)
    }

    fn provider(&self) -> &str {
        "ollama"
    }

    async fn ping(&self) -> Result<()> {
        self.send("/api/tags", None).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamSpec, ToolDescriptor};
    use serde_json::json;

    #[test]
    fn test_encode_request() {
        let turns = vec![
            Turn::system("sys"),
            Turn::user("What is 25 * 5?"),
            Turn::assistant(
                "",
                vec![ToolCall::with_arg("calculator", "expression", "25 * 5")],
            ),
            Turn::tool("calculator", "125"),
        ];
        let tools = vec![ToolDescriptor {
            name: "calculator".to_string(),
            description: "math".to_string(),
            parameters: vec![ParamSpec::required_string("expression", "expr")],
        }];

        let body = WireRequest {
            model: "llama3.1:8b",
            messages: turns.iter().map(WireMessage::from).collect(),
            stream: false,
            tools: tools.iter().map(|t| t.to_function_schema()).collect(),
        };
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["model"], "llama3.1:8b");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "system");
        assert!(value["messages"][1].get("tool_calls").is_none());
        assert_eq!(
            value["messages"][2]["tool_calls"][0]["function"]["arguments"]["expression"],
            "25 * 5"
        );
        assert_eq!(value["messages"][3]["role"], "tool");
        assert_eq!(value["messages"][3]["tool_name"], "calculator");
        assert_eq!(value["tools"][0]["function"]["name"], "calculator");
    }

    #[test]
    fn test_tools_omitted_when_empty() {
        let body = WireRequest {
            model: "m",
            messages: Vec::new(),
            stream: true,
            tools: Vec::new(),
        };
        assert!(serde_json::to_value(&body).unwrap().get("tools").is_none());
    }

    #[test]
    fn test_accumulate_single_response() {
        let mut acc = ReplyAccumulator::default();
        let body = json!({
            "model": "llama3.1:8b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "get_weather", "arguments": {"city": "Oslo"}}},
                    {"function": {"name": "calculator", "arguments": {"expression": "1+1"}}}
                ]
            },
            "done": true
        });

        assert!(acc.push_line(body.to_string().as_bytes()).unwrap());
        let reply = acc.finish();
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[0].name, "get_weather");
        assert_eq!(reply.tool_calls[0].arguments["city"], "Oslo");
        assert_eq!(reply.tool_calls[1].name, "calculator");
    }

    #[test]
    fn test_accumulate_stream_chunks() {
        let lines = [
            r#"{"message":{"role":"assistant","content":"The answer"},"done":false}"#,
            "",
            r#"{"message":{"role":"assistant","content":" is 125."},"done":false}"#,
            r#"{"message":{"role":"assistant","content":""},"done":true,"eval_count":12}"#,
        ];

        let mut acc = ReplyAccumulator::default();
        let mut done = false;
        for line in lines {
            done = acc.push_line(format!("{}\n", line).as_bytes()).unwrap();
        }
        assert!(done);
        assert_eq!(acc.finish(), ModelReply::text("The answer is 125."));
    }

    #[test]
    fn test_error_and_malformed_chunks() {
        let mut acc = ReplyAccumulator::default();
        let err = acc
            .push_line(br#"{"error":"model 'nope' not found"}"#)
            .unwrap_err();
        assert!(matches!(err, AgentError::Transport(msg) if msg.contains("not found")));

        let mut acc = ReplyAccumulator::default();
        assert!(matches!(
            acc.push_line(b"<html>"),
            Err(AgentError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_whitespace_around_chunks_is_ignored() {
        let mut acc = ReplyAccumulator::default();
        assert!(!acc.push_line(b" \r\n").unwrap());
        assert!(acc
            .push_line(b"  {\"message\":{\"role\":\"assistant\",\"content\":\"hi\"},\"done\":true}\r\n")
            .unwrap());
        assert_eq!(acc.finish(), ModelReply::text("hi"));
    }
}
