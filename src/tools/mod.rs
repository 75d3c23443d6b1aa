//! Tools module - capabilities the agent can invoke.
//!
//! Each tool declares a name, a description for the model, and the single
//! input key it reads from a directive's `input` object. Invocation failures
//! are converted to text by the registry; a tool can never abort the loop.

mod calculator;
mod dictionary;
mod search;
mod weather;

pub use calculator::Calculate;
pub use dictionary::LookupDefinition;
pub use search::WebSearch;
pub use weather::GetWeather;

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::ToolCall;
use crate::config::Config;

/// A capability the agent can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name used in tool directives.
    fn name(&self) -> &str;

    /// Human-readable description, shown to the model in the system prompt.
    fn description(&self) -> &str;

    /// The single input key this tool reads from a directive's `input` object.
    fn parameter(&self) -> &str;

    /// Execute the tool with its extracted argument.
    async fn invoke(&self, argument: &str) -> anyhow::Result<String>;
}

/// Registry of available tools, in prompt order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in tools.
    pub fn with_defaults(config: &Config) -> Self {
        let client = reqwest::Client::new();
        let mut registry = Self::new();
        registry.register(GetWeather::new(config.weather_api_key.clone(), client.clone()));
        registry.register(WebSearch::new(client.clone()));
        registry.register(Calculate);
        registry.register(LookupDefinition::new(config.dictionary_api_key.clone(), client));
        registry
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.push(Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Resolve a pending tool call to output text. Never fails: unknown tools
    /// and invocation errors both become descriptive text.
    pub async fn resolve(&self, call: &ToolCall) -> String {
        let Some(tool) = self.get(&call.tool_name) else {
            return format!("Tool '{}' is not available", call.tool_name);
        };

        // A missing input key is an empty-string argument, not a rejection.
        let argument = match call.tool_input.get(tool.parameter()) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        match tool.invoke(&argument).await {
            Ok(output) => output,
            Err(e) => format!("Tool execution failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolCall;
    use serde_json::{json, Map};

    fn input_with(key: &str, value: &str) -> Map<String, serde_json::Value> {
        let mut map = Map::new();
        map.insert(key.to_string(), json!(value));
        map
    }

    #[tokio::test]
    async fn unknown_tool_resolves_to_not_available_text() {
        let registry = ToolRegistry::with_defaults(&Config::new(None));
        let call = ToolCall::pending("fly_me_to_mars", Map::new());

        let output = registry.resolve(&call).await;
        assert_eq!(output, "Tool 'fly_me_to_mars' is not available");
    }

    #[tokio::test]
    async fn missing_argument_key_becomes_empty_string() {
        let registry = ToolRegistry::with_defaults(&Config::new(None));
        let call = ToolCall::pending("calculate", Map::new());

        let output = registry.resolve(&call).await;
        assert!(output.starts_with("Error calculating:"), "got: {output}");
    }

    #[tokio::test]
    async fn calculator_resolves_through_registry() {
        let registry = ToolRegistry::with_defaults(&Config::new(None));
        let call = ToolCall::pending("calculate", input_with("expression", "2 + 3"));

        let output = registry.resolve(&call).await;
        assert_eq!(output, "Result of '2 + 3' = 5");
    }
}
