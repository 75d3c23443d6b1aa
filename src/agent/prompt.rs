//! System prompt for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions and the directive syntax.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list()
        .iter()
        .map(|t| format!("- {}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a helpful AI assistant with access to tools.
You can use the following tools when appropriate:
{tool_descriptions}

When you need to use a tool, use the following format:
```tool
{{"name": "tool_name", "input": {{"param_name": "value"}}}}
```

Otherwise, respond directly to the user in a helpful, informative, and friendly manner.
Use the tools when relevant to the user's request, but don't suggest using tools when you can answer directly."#
    )
}
