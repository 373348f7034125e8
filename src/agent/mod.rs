//! Conversational agent with tool calling.
//!
//! The runner drives one user turn at a time: it sends the transcript to
//! the model, extracts tool calls from the reply, executes them and feeds
//! the results back until the model produces a final answer.

mod parser;
mod runner;

pub use parser::{TextInvocation, ToolInvocationParser};
pub use runner::{Agent, AgentEvent, AgentResponse, ToolCallRecord};
