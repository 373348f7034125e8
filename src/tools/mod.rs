//! Tools the model can call.
//!
//! Every tool declares a flat parameter schema. The executor validates the
//! model's untyped argument map against that schema before a tool ever
//! sees it, and each tool then converts the validated map into its own
//! typed argument record.

mod calculator;
mod executor;
mod registry;
mod search;
mod weather;

pub use calculator::{evaluate, CalcError, CalculatorTool};
pub use executor::ToolExecutor;
pub use registry::ToolRegistry;
pub use search::SearchTool;
pub use weather::WeatherTool;

use crate::config::ToolSettings;
use crate::error::{AgentError, Result, ToolError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

/// Names of the tools shipped with toolrelay, in catalog order.
pub const BUILTIN_TOOLS: &[&str] = &["calculator", "get_weather", "search"];

/// A capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in calls. Matched case-insensitively.
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// Declared parameters, in order.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Run the tool on arguments that already passed schema validation.
    async fn execute(&self, args: ToolArgs) -> std::result::Result<String, ToolError>;

    /// Descriptor advertised to the model.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Scalar types a parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

impl ParamType {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a tool's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
}

impl ParamSpec {
    /// A required string parameter.
    pub fn required_string(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type: ParamType::String,
            description: description.to_string(),
            required: true,
        }
    }
}

/// Name, description and schema of a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// JSON schema of the parameters object.
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    json!({
                        "type": p.param_type.as_str(),
                        "description": p.description,
                    }),
                )
            })
            .collect();

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Function-calling definition in the `{"type": "function", ...}` shape.
    pub fn to_function_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }

    /// First required parameter; free-text calls bind their input here.
    pub fn primary_param(&self) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.required)
            .or_else(|| self.parameters.first())
            .map(|p| p.name.as_str())
    }
}

/// Arguments that passed schema validation for one tool.
#[derive(Debug, Clone)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    /// Check `arguments` against `params`.
    ///
    /// Every required key must be present and non-null, and every declared
    /// key that is present must have the declared type. Undeclared keys are
    /// passed through.
    pub fn validate(
        tool: &str,
        params: &[ParamSpec],
        arguments: &Map<String, Value>,
    ) -> std::result::Result<Self, ToolError> {
        for param in params {
            match arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(ToolError::InvalidArguments {
                        tool: tool.to_string(),
                        reason: format!("missing required argument '{}'", param.name),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.param_type.matches(value) => {
                    return Err(ToolError::InvalidArguments {
                        tool: tool.to_string(),
                        reason: format!(
                            "argument '{}' must be a {}, got {}",
                            param.name,
                            param.param_type.as_str(),
                            json_type_name(value)
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        for key in arguments.keys() {
            if !params.iter().any(|p| &p.name == key) {
                debug!("Ignoring undeclared argument '{}' for tool {}", key, tool);
            }
        }

        Ok(Self {
            tool: tool.to_string(),
            values: arguments.clone(),
        })
    }

    /// Convert into a typed argument record.
    pub fn parse<T: DeserializeOwned>(self) -> std::result::Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.values)).map_err(|e| {
            ToolError::InvalidArguments {
                tool: self.tool,
                reason: e.to_string(),
            }
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build the HTTP client shared by the network-backed tools.
pub fn http_client(settings: &ToolSettings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// GET a URL and decode its JSON body.
///
/// Non-2xx statuses and undecodable bodies are reported as failures with
/// a description suitable for a tool result.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: url::Url,
) -> std::result::Result<T, ToolError> {
    debug!("GET {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ToolError::Failed(format!("Error: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::Failed(format!(
            "Error: request failed with HTTP {}",
            status
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ToolError::Failed(format!("Error: malformed response: {}", e)))
}

/// Build a registry holding the enabled built-in tools, in configured order.
///
/// Fails on names with no built-in handler, so everything advertised to
/// the model is guaranteed to be executable.
pub fn builtin_registry(settings: &ToolSettings) -> Result<ToolRegistry> {
    let client = http_client(settings)?;
    let mut registry = ToolRegistry::new();

    for name in &settings.enabled {
        match name.trim().to_lowercase().as_str() {
            "calculator" => registry.register(CalculatorTool)?,
            "get_weather" => registry.register(WeatherTool::new(client.clone(), settings)?)?,
            "search" => registry.register(SearchTool::new(client.clone(), settings)?)?,
            other => {
                return Err(AgentError::Config(format!(
                    "Unknown tool '{}' in tools.enabled (available: {})",
                    other,
                    BUILTIN_TOOLS.join(", ")
                )))
            }
        }
    }

    Ok(registry)
}
