//! Agent runner with tool calling loop.

use super::parser::ToolInvocationParser;
use crate::config::{Prompts, Settings, ToolCallMode};
use crate::conversation::{Conversation, ToolCall, Turn};
use crate::error::Result;
use crate::inference::{ChatRequest, InferenceClient, ModelReply};
use crate::tools::{ToolDescriptor, ToolExecutor, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Progress notifications emitted while a turn runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ToolStarted {
        name: String,
        arguments: String,
    },
    ToolFinished {
        name: String,
        result: String,
        success: bool,
        elapsed: Duration,
    },
}

type Observer = Box<dyn Fn(&AgentEvent) + Send + Sync>;

/// Where one user turn is in the request/execute cycle.
enum AgentState {
    AwaitingModel,
    ModelResponded(ModelReply),
    ToolCallsPending(Vec<ToolCall>),
    Done { content: String, truncated: bool },
}

/// Agent that answers user input, calling tools as the model asks.
pub struct Agent {
    client: Arc<dyn InferenceClient>,
    executor: ToolExecutor,
    parser: ToolInvocationParser,
    catalog: Vec<ToolDescriptor>,
    model: String,
    mode: ToolCallMode,
    stream: bool,
    max_tool_rounds: usize,
    observer: Option<Observer>,
}

impl Agent {
    /// Create a new agent with default loop settings.
    pub fn new(client: Arc<dyn InferenceClient>, registry: Arc<ToolRegistry>, model: &str) -> Self {
        let defaults = crate::config::AgentSettings::default();
        let catalog = registry.list();
        Self {
            client,
            parser: ToolInvocationParser::new(&catalog),
            executor: ToolExecutor::new(registry, Duration::from_secs(defaults.tool_timeout_secs)),
            catalog,
            model: model.to_string(),
            mode: defaults.mode,
            stream: false,
            max_tool_rounds: defaults.max_tool_rounds,
            observer: None,
        }
    }

    /// Create an agent configured from `settings`.
    pub fn from_settings(
        settings: &Settings,
        client: Arc<dyn InferenceClient>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self::new(client, registry, &settings.model.model)
            .with_mode(settings.agent.mode)
            .with_stream(settings.model.stream)
            .with_max_tool_rounds(settings.agent.max_tool_rounds)
            .with_tool_timeout(Duration::from_secs(settings.agent.tool_timeout_secs))
    }

    /// Set how tool calls are read from replies.
    pub fn with_mode(mut self, mode: ToolCallMode) -> Self {
        self.mode = mode;
        self
    }

    /// Request streamed replies from the endpoint.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the maximum number of tool batches per user turn.
    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    /// Set the per-call tool timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    /// Receive [`AgentEvent`]s as tools run.
    pub fn with_observer(mut self, observer: impl Fn(&AgentEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn mode(&self) -> ToolCallMode {
        self.mode
    }

    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// Start a conversation whose system prompt fits this agent's mode.
    pub fn new_conversation(&self, prompts: &Prompts) -> Conversation {
        Conversation::new(prompts.system_prompt(self.mode, &self.catalog))
    }

    /// Run one user turn to completion.
    ///
    /// Appends the user turn, then alternates model requests and tool
    /// batches until the model answers without calling a tool. Each batch
    /// is recorded as one assistant turn followed by one tool turn per
    /// call, in call order. Once `max_tool_rounds` batches have run, a
    /// further request for tools ends the turn with the reply text and
    /// `truncated` set.
    ///
    /// A model failure aborts the turn; turns appended before the failure
    /// stay in the conversation.
    #[instrument(skip_all, fields(conversation = %conversation.id()))]
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: &str,
    ) -> Result<AgentResponse> {
        conversation.append(Turn::user(input))?;

        let mut state = AgentState::AwaitingModel;
        let mut rounds = 0;
        let mut model_calls = 0;
        let mut records = Vec::new();

        loop {
            state = match state {
                AgentState::AwaitingModel => {
                    model_calls += 1;
                    debug!("Model request {}", model_calls);

                    let tools: &[ToolDescriptor] = match self.mode {
                        ToolCallMode::Text => &[],
                        ToolCallMode::Structured | ToolCallMode::Auto => &self.catalog,
                    };
                    let request = ChatRequest {
                        model: &self.model,
                        messages: conversation.turns(),
                        tools,
                        stream: self.stream,
                    };

                    match self.client.chat(request).await {
                        Ok(reply) => AgentState::ModelResponded(reply),
                        Err(e) => {
                            warn!("Model request failed: {}", e);
                            return Err(e);
                        }
                    }
                }

                AgentState::ModelResponded(reply) => {
                    let calls = self.parser.extract(&reply, self.mode);
                    if calls.is_empty() {
                        conversation.append(Turn::assistant(reply.text.clone(), Vec::new()))?;
                        AgentState::Done {
                            content: reply.text,
                            truncated: false,
                        }
                    } else if rounds >= self.max_tool_rounds {
                        warn!(
                            "Stopping after {} tool round(s); dropping {} requested call(s)",
                            rounds,
                            calls.len()
                        );
                        conversation.append(Turn::assistant(reply.text.clone(), Vec::new()))?;
                        AgentState::Done {
                            content: reply.text,
                            truncated: true,
                        }
                    } else {
                        conversation.append(Turn::assistant(reply.text, calls.clone()))?;
                        AgentState::ToolCallsPending(calls)
                    }
                }

                AgentState::ToolCallsPending(calls) => {
                    rounds += 1;
                    info!("Tool round {} with {} call(s)", rounds, calls.len());

                    for call in calls {
                        let record = self.run_tool(&call).await;
                        conversation.append(Turn::tool(call.name, record.result.clone()))?;
                        records.push(record);
                    }
                    AgentState::AwaitingModel
                }

                AgentState::Done { content, truncated } => {
                    return Ok(AgentResponse {
                        content,
                        tool_calls: records,
                        rounds,
                        model_calls,
                        truncated,
                    });
                }
            };
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn run_tool(&self, call: &ToolCall) -> ToolCallRecord {
        let arguments = Value::Object(call.arguments.clone()).to_string();
        self.emit(AgentEvent::ToolStarted {
            name: call.name.clone(),
            arguments: arguments.clone(),
        });

        let started = Instant::now();
        let outcome = self.executor.try_execute(call).await;
        let success = outcome.is_ok();
        let result = ToolExecutor::render(&call.name, outcome);

        self.emit(AgentEvent::ToolFinished {
            name: call.name.clone(),
            result: result.clone(),
            success,
            elapsed: started.elapsed(),
        });

        ToolCallRecord {
            name: call.name.clone(),
            arguments,
            result,
        }
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}

/// Response from one user turn.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final assistant text.
    pub content: String,
    /// Record of all tool calls made during the turn.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of tool batches executed.
    pub rounds: usize,
    /// Number of model requests made.
    pub model_calls: usize,
    /// Set when the round limit cut the turn short.
    pub truncated: bool,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::error::AgentError;
    use crate::tools::CalculatorTool;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records what it was sent.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<ModelReply>>>,
        requests: Mutex<Vec<(usize, usize)>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<ModelReply>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        /// `(message count, tool count)` of every request so far.
        fn requests(&self) -> Vec<(usize, usize)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InferenceClient for ScriptedClient {
        async fn chat(&self, request: ChatRequest<'_>) -> Result<ModelReply> {
            self.requests
                .lock()
                .unwrap()
                .push((request.messages.len(), request.tools.len()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelReply::text("out of script")))
        }

        fn provider(&self) -> &str {
            "scripted"
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn calls(calls: Vec<ToolCall>) -> Result<ModelReply> {
        Ok(ModelReply {
            text: String::new(),
            tool_calls: calls,
        })
    }

    fn calc(expr: &str) -> ToolCall {
        ToolCall::with_arg("calculator", "expression", expr)
    }

    fn agent(client: Arc<ScriptedClient>) -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(CalculatorTool).unwrap();
        Agent::new(client, Arc::new(registry), "test-model")
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "search".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "Found results".to_string(),
        };
        assert_eq!(format!("{}", record), r#"search({"query": "test"})"#);
    }

    #[tokio::test]
    async fn test_calculator_round_trip() {
        let client = ScriptedClient::new(vec![
            calls(vec![calc("25 * 5")]),
            Ok(ModelReply::text("25 * 5 = 125")),
        ]);
        let agent = agent(client.clone());
        let mut conversation = Conversation::new("sys");

        let response = agent
            .run_turn(&mut conversation, "What is 25 * 5?")
            .await
            .unwrap();

        assert_eq!(response.content, "25 * 5 = 125");
        assert_eq!(response.rounds, 1);
        assert_eq!(response.model_calls, 2);
        assert!(!response.truncated);
        assert_eq!(response.tool_calls[0].result, "125");

        let roles: Vec<Role> = conversation.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(conversation.turns()[3].text, "125");
        assert_eq!(conversation.turns()[3].tool_name.as_deref(), Some("calculator"));

        // Second request carries the tool result; the catalog goes with both.
        assert_eq!(client.requests(), vec![(2, 1), (4, 1)]);
    }

    #[tokio::test]
    async fn test_batch_results_follow_call_order() {
        let client = ScriptedClient::new(vec![
            calls(vec![
                calc("1 + 1"),
                ToolCall::with_arg("translate", "text", "hola"),
                calc("2 * 3"),
                calc("2 * 3"),
            ]),
            Ok(ModelReply::text("done")),
        ]);
        let agent = agent(client);
        let mut conversation = Conversation::new("sys");

        let response = agent.run_turn(&mut conversation, "go").await.unwrap();

        let tool_turns: Vec<&Turn> = conversation
            .turns()
            .iter()
            .filter(|t| t.role == Role::Tool)
            .collect();
        assert_eq!(tool_turns.len(), 4);
        assert_eq!(tool_turns[0].text, "2");
        assert!(tool_turns[1].text.starts_with("Error: tool not found: 'translate'"));
        assert_eq!(tool_turns[2].text, "6");
        assert_eq!(tool_turns[3].text, "6");
        assert_eq!(response.tool_calls.len(), 4);
        assert_eq!(response.rounds, 1);
    }

    #[tokio::test]
    async fn test_text_mode_directive() {
        let client = ScriptedClient::new(vec![
            Ok(ModelReply::text("TOOL: calculator\nINPUT: 2 + 2")),
            Ok(ModelReply::text("It is 4.")),
        ]);
        let agent = agent(client.clone()).with_mode(ToolCallMode::Text);
        let mut conversation = Conversation::new("sys");

        let response = agent.run_turn(&mut conversation, "2 + 2?").await.unwrap();

        assert_eq!(response.content, "It is 4.");
        assert_eq!(conversation.turns()[2].tool_calls, vec![calc("2 + 2")]);
        assert_eq!(conversation.turns()[3].text, "4");
        // No catalog is sent in text mode.
        assert!(client.requests().iter().all(|(_, tools)| *tools == 0));
    }

    #[tokio::test]
    async fn test_round_limit_truncates() {
        let client = ScriptedClient::new(vec![
            calls(vec![calc("1")]),
            calls(vec![calc("2")]),
            Ok(ModelReply {
                text: "still working".to_string(),
                tool_calls: vec![calc("3")],
            }),
        ]);
        let agent = agent(client).with_max_tool_rounds(2);
        let mut conversation = Conversation::new("sys");

        let response = agent.run_turn(&mut conversation, "loop").await.unwrap();

        assert!(response.truncated);
        assert_eq!(response.rounds, 2);
        assert_eq!(response.model_calls, 3);
        assert_eq!(response.content, "still working");

        let last = conversation.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.tool_calls.is_empty());
        assert_eq!(conversation.pending_tool_results(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_keeps_earlier_turns() {
        let client = ScriptedClient::new(vec![
            calls(vec![calc("3 * 3")]),
            Err(AgentError::Transport("connection refused".to_string())),
        ]);
        let agent = agent(client);
        let mut conversation = Conversation::new("sys");

        let err = agent.run_turn(&mut conversation, "3 * 3?").await.unwrap_err();

        assert!(matches!(err, AgentError::Transport(_)));
        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.last().unwrap().text, "9");
    }

    #[tokio::test]
    async fn test_failure_before_any_reply() {
        let client = ScriptedClient::new(vec![Err(AgentError::Transport("down".to_string()))]);
        let agent = agent(client);
        let mut conversation = Conversation::new("sys");

        assert!(agent.run_turn(&mut conversation, "hi").await.is_err());
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn test_observer_sees_each_tool() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let client = ScriptedClient::new(vec![
            calls(vec![calc("1 / 0")]),
            Ok(ModelReply::text("cannot divide by zero")),
        ]);
        let agent = agent(client).with_observer(move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        let mut conversation = Conversation::new("sys");
        agent.run_turn(&mut conversation, "1 / 0").await.unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], AgentEvent::ToolStarted { name, .. } if name == "calculator"));
        // The calculator reports errors as its result text.
        assert!(matches!(
            &events[1],
            AgentEvent::ToolFinished { result, .. } if result.starts_with("Error calculating")
        ));
    }

    #[tokio::test]
    async fn test_multi_turn_conversation_grows() {
        let client = ScriptedClient::new(vec![
            Ok(ModelReply::text("Hello!")),
            calls(vec![calc("10 - 4")]),
            Ok(ModelReply::text("6")),
        ]);
        let agent = agent(client);
        let mut conversation = Conversation::new("sys");

        agent.run_turn(&mut conversation, "hi").await.unwrap();
        let first = conversation.snapshot();
        agent.run_turn(&mut conversation, "10 - 4?").await.unwrap();

        assert_eq!(&conversation.turns()[..first.len()], &first[..]);
        assert_eq!(conversation.len(), first.len() + 4);
    }
}
