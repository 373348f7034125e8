//! toolrelay - a tool-calling conversational agent
//!
//! Runs a chat model in a loop with a small set of tools. The model either
//! returns native tool calls or writes `TOOL:` / `INPUT:` directives; the
//! agent executes the requested tools, feeds the results back and repeats
//! until the model gives a final answer.
//!
//! # Architecture
//!
//! - `tools` - Tool trait, registry, executor and the built-in tools
//! - `conversation` - Append-only transcript of turns
//! - `inference` - Chat endpoint abstraction (Ollama, OpenAI-compatible)
//! - `agent` - Tool-call parsing and the agent loop
//! - `config` - Settings and prompt templates
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolrelay::agent::Agent;
//! use toolrelay::config::{Prompts, Settings};
//! use toolrelay::inference::create_client;
//! use toolrelay::tools::builtin_registry;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let registry = Arc::new(builtin_registry(&settings.tools)?);
//!     let client = create_client(&settings.model)?;
//!     let agent = Agent::from_settings(&settings, client, registry);
//!
//!     let mut conversation = agent.new_conversation(&Prompts::default());
//!     let response = agent.run_turn(&mut conversation, "What is 25 * 5?").await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod inference;
pub mod openai;
pub mod tools;

pub use error::{AgentError, Result, ToolError};
