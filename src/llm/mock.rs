//! Scripted mock model client (for tests, no API required).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatMessage, LlmClient};

/// Mock client that replays a fixed script of responses.
///
/// Each call to [`LlmClient::chat`] pops the next scripted entry. When the
/// script is exhausted, the fallback response is returned (empty text if none
/// was set), so a turn can always run to termination.
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
}

impl MockLlmClient {
    /// Replay the given responses in order, then return empty text.
    pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            fallback: None,
        }
    }

    /// Return the same response on every call.
    pub fn repeating(response: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response.into()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        let next = self.script.lock().expect("mock script lock").pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(self.fallback.clone().unwrap_or_default()),
        }
    }
}
