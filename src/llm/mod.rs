//! Model client abstraction.
//!
//! The agent talks to the model through the [`LlmClient`] trait: an ordered
//! list of role-tagged messages in, free text out. The text may embed tool
//! directives; parsing those is the agent's job, not the client's.

mod gemini;
pub mod mock;

pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Message role in a model request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in a model request.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self { role: Role::Tool, content: content.into() }
    }
}

/// A hosted language model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the full message sequence and return the model's text response.
    async fn chat(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}
