//! Configuration module for toolrelay.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, ModelProvider, ModelSettings, PromptSettings, Settings,
    ToolCallMode, ToolSettings,
};
