//! Tool registry keyed by case-insensitive name.

use super::{Tool, ToolDescriptor};
use crate::error::{AgentError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available tools.
///
/// Tools are kept in registration order so the catalog advertised to the
/// model is identical on every request.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Fails if the name is taken, ignoring case.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register an already shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let key = tool.name().trim().to_lowercase();
        if key.is_empty() {
            return Err(AgentError::InvalidInput("tool name cannot be empty".to_string()));
        }
        if self.index.contains_key(&key) {
            return Err(AgentError::DuplicateTool(tool.name().to_string()));
        }

        self.index.insert(key, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Find a tool by name, ignoring case and surrounding whitespace.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.index
            .get(&name.trim().to_lowercase())
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))
    }

    /// Descriptors of all tools, in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tools::{ParamSpec, ToolArgs};
    use async_trait::async_trait;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn parameters(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::required_string("input", "anything")]
        }

        async fn execute(&self, _args: ToolArgs) -> std::result::Result<String, ToolError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_duplicate_names_rejected_case_insensitively() {
        let mut registry = ToolRegistry::new();
        registry.register(NamedTool("search")).unwrap();

        let err = registry.register(NamedTool("SEARCH")).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "SEARCH"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = ToolRegistry::new();
        registry.register(NamedTool("get_weather")).unwrap();

        assert_eq!(registry.lookup("Get_Weather").unwrap().name(), "get_weather");
        assert_eq!(registry.lookup(" get_weather ").unwrap().name(), "get_weather");
        assert!(matches!(
            registry.lookup("weather"),
            Err(AgentError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_list_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(NamedTool(name)).unwrap();
        }

        let first: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        let second: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(first, vec!["zeta", "alpha", "mid"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(NamedTool("  ")).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_debug_lists_tool_names() {
        let mut registry = ToolRegistry::new();
        registry.register(NamedTool("calculator")).unwrap();
        registry.register(NamedTool("search")).unwrap();

        assert_eq!(
            format!("{:?}", registry),
            r#"ToolRegistry { tools: ["calculator", "search"] }"#
        );
    }
}
