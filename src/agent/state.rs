//! Conversation state threaded through the agent loop.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

/// One turn in the conversation. Append-only; never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,

    pub content: String,

    /// Correlates a tool-role message to the call that produced it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into(), tool_call_id: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into(), tool_call_id: None }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A requested tool invocation.
///
/// Created pending by the model-consultation phase; resolved exactly once by
/// the tool-execution phase, then never mutated again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,

    pub tool_input: Map<String, Value>,

    /// `None` means the call has not been executed yet.
    pub tool_output: Option<String>,
}

impl ToolCall {
    pub fn pending(tool_name: impl Into<String>, tool_input: Map<String, Value>) -> Self {
        Self { tool_name: tool_name.into(), tool_input, tool_output: None }
    }

    pub fn is_pending(&self) -> bool {
        self.tool_output.is_none()
    }
}

/// Mutable record for one conversation, threaded through the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub conversation_id: String,

    /// Ordered conversation history. Only ever gains entries.
    pub messages: Vec<Message>,

    /// Tool calls accumulated across the whole loop, not reset per iteration.
    pub tool_calls: Vec<ToolCall>,

    /// Most recent assistant text, if any.
    pub current_response: Option<String>,

    /// Number of model consultations in the current turn.
    pub iteration_count: u32,
}

impl AgentState {
    /// Fresh state for a new conversation.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            tool_calls: Vec::new(),
            current_response: None,
            iteration_count: 0,
        }
    }

    /// Derive the state for a new turn on top of accumulated history:
    /// messages, tool calls and last response carry over, the iteration
    /// counter resets to 0.
    pub fn next_turn(&self) -> Self {
        Self {
            conversation_id: self.conversation_id.clone(),
            messages: self.messages.clone(),
            tool_calls: self.tool_calls.clone(),
            current_response: self.current_response.clone(),
            iteration_count: 0,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Whether the model produced a non-empty response this iteration.
    pub fn has_response(&self) -> bool {
        self.current_response.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Tool calls that have been executed and carry an output.
    pub fn resolved_tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.tool_calls.iter().filter(|t| !t.is_pending())
    }

    /// The content of the last assistant message, if any.
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_turn_carries_history_and_resets_iterations() {
        let mut state = AgentState::new("conv_1");
        state.push_user("hello");
        state.messages.push(Message::assistant("hi"));
        state.tool_calls.push(ToolCall::pending("calculate", Map::new()));
        state.current_response = Some("hi".to_string());
        state.iteration_count = 3;

        let next = state.next_turn();
        assert_eq!(next.conversation_id, "conv_1");
        assert_eq!(next.messages.len(), 2);
        assert_eq!(next.tool_calls.len(), 1);
        assert_eq!(next.current_response.as_deref(), Some("hi"));
        assert_eq!(next.iteration_count, 0);
    }

    #[test]
    fn empty_response_counts_as_absent() {
        let mut state = AgentState::new("conv_1");
        assert!(!state.has_response());
        state.current_response = Some(String::new());
        assert!(!state.has_response());
        state.current_response = Some("answer".to_string());
        assert!(state.has_response());
    }
}
