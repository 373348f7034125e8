//! Conversation transcript shared by every model call.
//!
//! A [`Conversation`] is an append-only list of [`Turn`]s. It is owned by
//! whoever drives the agent loop and lent to it by `&mut` for the duration
//! of one user turn, so independent sessions never share state.

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A request from the model to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Build a call with a single string argument.
    pub fn with_arg(name: impl Into<String>, key: &str, value: impl Into<String>) -> Self {
        let mut arguments = Map::new();
        arguments.insert(key.to_string(), Value::String(value.into()));
        Self::new(name, arguments)
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, Value::Object(self.arguments.clone()))
    }
}

/// One entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Only present on assistant turns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Name of the tool a tool turn answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            tool_calls,
            tool_name: None,
        }
    }

    pub fn tool(tool_name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            text: result.into(),
            tool_calls: Vec::new(),
            tool_name: Some(tool_name.into()),
        }
    }

    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }
}

/// Append-only transcript for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: Uuid,
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation with a system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: vec![Turn::system(system_prompt)],
        }
    }

    /// Start a conversation without any turns.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    /// Session id, used for log correlation and transcript file names.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Copy of the current turns, for comparing before/after an append.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Append a turn, enforcing the transcript invariants.
    ///
    /// Only assistant turns may carry tool calls, and a tool turn must
    /// answer a still-unanswered call of the closest preceding assistant
    /// turn, with no other turn kind in between.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        if turn.role != Role::Assistant && !turn.tool_calls.is_empty() {
            return Err(AgentError::Conversation(format!(
                "{} turns cannot carry tool calls",
                turn.role
            )));
        }

        if turn.role == Role::Tool && self.pending_tool_results() == 0 {
            return Err(AgentError::Conversation(
                "tool turn does not answer any pending tool call".to_string(),
            ));
        }

        self.turns.push(turn);
        Ok(())
    }

    /// Number of calls in the trailing assistant turn that have no tool
    /// turn yet.
    pub fn pending_tool_results(&self) -> usize {
        let answered = self
            .turns
            .iter()
            .rev()
            .take_while(|t| t.role == Role::Tool)
            .count();

        match self.turns.iter().rev().nth(answered) {
            Some(turn) if turn.role == Role::Assistant => {
                turn.tool_calls.len().saturating_sub(answered)
            }
            _ => 0,
        }
    }

    /// Write the transcript as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
