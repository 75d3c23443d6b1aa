//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agent::ToolCall;

/// Request to submit a query to the agent.
#[derive(Debug, Clone, Deserialize)]
pub struct UserQuery {
    /// The user's natural-language query
    pub query: String,

    /// Continue an existing conversation; a new id is assigned if absent
    pub conversation_id: Option<String>,
}

/// A resolved tool call, as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallView {
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    pub tool_output: String,
}

impl From<&ToolCall> for ToolCallView {
    fn from(call: &ToolCall) -> Self {
        Self {
            tool_name: call.tool_name.clone(),
            tool_input: call.tool_input.clone(),
            tool_output: call.tool_output.clone().unwrap_or_default(),
        }
    }
}

/// Response to a query.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    /// Final assistant text
    pub response: String,

    /// Conversation id to use for follow-up queries
    pub conversation_id: String,

    /// Tool calls resolved during this conversation
    pub tool_calls: Vec<ToolCallView>,
}

/// Response to a conversation delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub status: String,
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `warning` when the model API key is missing
    pub status: String,

    pub api_key_configured: bool,

    /// Service version
    pub version: String,
}
