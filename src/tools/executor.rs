//! Dispatch of parsed tool calls.

use super::{ToolArgs, ToolRegistry};
use crate::conversation::ToolCall;
use crate::error::ToolError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Runs tool calls against a registry.
///
/// Every outcome, including unknown tools, bad arguments, timeouts and
/// panics, resolves to the text of the next tool turn.
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute a call and return its result text.
    pub async fn execute(&self, call: &ToolCall) -> String {
        Self::render(&call.name, self.try_execute(call).await)
    }

    /// Text of the tool turn for an outcome. Failures are logged.
    pub fn render(tool: &str, outcome: Result<String, ToolError>) -> String {
        outcome.unwrap_or_else(|e| {
            warn!("Tool call {} failed: {}", tool, e);
            e.to_string()
        })
    }

    /// Execute a call, keeping the failure kind.
    #[instrument(skip(self, call), fields(tool = %call.name))]
    pub async fn try_execute(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .registry
            .lookup(&call.name)
            .map_err(|_| ToolError::NotFound {
                name: call.name.clone(),
                available: self.registry.names().join(", "),
            })?;

        let args = ToolArgs::validate(tool.name(), &tool.parameters(), &call.arguments)?;

        info!("Executing tool {}", call);

        let run = AssertUnwindSafe(tool.execute(args)).catch_unwind();
        match tokio::time::timeout(self.timeout, run).await {
            Err(_) => Err(ToolError::Timeout {
                tool: tool.name().to_string(),
                timeout: self.timeout,
            }),
            Ok(Err(_)) => Err(ToolError::Panicked(tool.name().to_string())),
            Ok(Ok(result)) => result,
        }
    }
}
