//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::Config;
use crate::llm::{ChatMessage, GeminiClient, LlmClient};
use crate::tools::ToolRegistry;

use super::directive::extract_directives;
use super::prompt::build_system_prompt;
use super::state::{AgentState, Message, MessageRole, ToolCall};

/// Fallback text when a turn ends without any model response.
const NO_RESPONSE_FALLBACK: &str = "I processed your request but couldn't generate a response.";

/// Outcome of the continuation policy after a tool-execution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Go back to model consultation.
    Continue,
    /// Terminate the turn; the final assistant message has been appended.
    End,
}

/// The tool-using agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    max_iterations: u32,
}

impl Agent {
    /// Create an agent with the Gemini client and the built-in tools.
    pub fn new(config: &Config) -> Self {
        let llm = Arc::new(GeminiClient::new(
            config.api_key.clone().unwrap_or_default(),
            config.default_model.clone(),
        ));
        let tools = ToolRegistry::with_defaults(config);
        Self { llm, tools, max_iterations: config.max_iterations }
    }

    /// Create an agent with an explicit client and tool set.
    pub fn with_client(llm: Arc<dyn LlmClient>, tools: ToolRegistry, max_iterations: u32) -> Self {
        Self { llm, tools, max_iterations }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one full turn on the given state: alternate model consultation and
    /// tool execution until the continuation policy terminates the loop.
    ///
    /// On return the final assistant message has been appended (except when
    /// the ceiling fired with an empty response) and every tool call created
    /// during the turn is resolved.
    pub async fn run_turn(&self, state: &mut AgentState) {
        loop {
            self.consult_model(state).await;
            self.execute_tools(state).await;
            match self.continuation(state) {
                Flow::Continue => continue,
                Flow::End => break,
            }
        }
    }

    /// Model-consultation phase: ask the model what to do next, then parse
    /// any tool directives out of its response.
    async fn consult_model(&self, state: &mut AgentState) {
        state.iteration_count += 1;
        tracing::debug!(
            conversation = %state.conversation_id,
            iteration = state.iteration_count,
            "consulting model"
        );

        let mut request = Vec::with_capacity(state.messages.len() + 1);
        request.push(ChatMessage::system(build_system_prompt(&self.tools)));
        for message in &state.messages {
            request.push(match message.role {
                MessageRole::User => ChatMessage::user(message.content.clone()),
                MessageRole::Assistant => ChatMessage::assistant(message.content.clone()),
                MessageRole::Tool => ChatMessage::tool(message.content.clone()),
            });
        }

        // A failed model call degrades to "no directives, empty response"
        // rather than aborting the conversation.
        let content = match self.llm.chat(&request).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(conversation = %state.conversation_id, "model call failed: {e:#}");
                String::new()
            }
        };

        let (directives, text) = extract_directives(&content);
        for directive in directives {
            state.tool_calls.push(ToolCall::pending(directive.name, directive.input));
        }
        state.current_response = Some(text);
    }

    /// Tool-execution phase: resolve every pending tool call, in list order,
    /// appending one tool message per resolution.
    async fn execute_tools(&self, state: &mut AgentState) {
        for index in 0..state.tool_calls.len() {
            if !state.tool_calls[index].is_pending() {
                continue;
            }

            let output = self.tools.resolve(&state.tool_calls[index]).await;
            tracing::debug!(
                conversation = %state.conversation_id,
                tool = %state.tool_calls[index].tool_name,
                "tool resolved"
            );

            let tool_call_id = format!("call_{}", state.messages.len() + index);
            state.messages.push(Message::tool(output.clone(), tool_call_id));
            state.tool_calls[index].tool_output = Some(output);
        }
    }

    /// Continuation policy, evaluated after each tool-execution phase.
    ///
    /// Precedence: iteration ceiling, pending tool calls, executed tools with
    /// a response, executed tools without one, no tools at all.
    fn continuation(&self, state: &mut AgentState) -> Flow {
        if state.iteration_count >= self.max_iterations {
            let unresolved = state.tool_calls.iter().filter(|t| t.is_pending()).count();
            if unresolved > 0 {
                tracing::warn!(
                    conversation = %state.conversation_id,
                    unresolved,
                    "iteration ceiling reached with unresolved tool calls"
                );
            }
            if state.has_response() {
                let response = state.current_response.clone().unwrap_or_default();
                state.messages.push(Message::assistant(response));
            }
            return Flow::End;
        }

        let pending = state.tool_calls.iter().any(|t| t.is_pending());
        let executed = state.tool_calls.iter().any(|t| !t.is_pending());

        if pending {
            // Tools resolve eagerly in the same pass, so this path exists for
            // defensive completeness.
            return Flow::Continue;
        }

        if executed && state.has_response() {
            let response = state.current_response.clone().unwrap_or_default();
            state.messages.push(Message::assistant(response));
            return Flow::End;
        }

        if executed {
            // Tool output is in the history but the model hasn't summarized
            // it yet; loop so it can produce a response.
            return Flow::Continue;
        }

        let response = state
            .current_response
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());
        state.messages.push(Message::assistant(response));
        Flow::End
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockLlmClient;
    use crate::tools::ToolRegistry;

    const CEILING: u32 = 8;

    fn calculator_agent(llm: MockLlmClient) -> Agent {
        let tools = ToolRegistry::with_defaults(&Config::new(None));
        Agent::with_client(Arc::new(llm), tools, CEILING)
    }

    fn state_with_query(query: &str) -> AgentState {
        let mut state = AgentState::new("conv_test");
        state.push_user(query);
        state
    }

    fn directive(name: &str, key: &str, value: &str) -> String {
        format!(
            "```tool\n{{\"name\": \"{name}\", \"input\": {{\"{key}\": \"{value}\"}}}}\n```"
        )
    }

    #[tokio::test]
    async fn calculator_query_runs_tool_then_answers() {
        let llm = MockLlmClient::scripted(vec![
            Ok(directive("calculate", "expression", "24 * 7 + 365")),
            Ok("The result is 2533.".to_string()),
        ]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("Calculate 24 * 7 + 365");

        agent.run_turn(&mut state).await;

        assert_eq!(state.iteration_count, 2);
        assert_eq!(state.tool_calls.len(), 1);
        let output = state.tool_calls[0].tool_output.as_deref().unwrap();
        assert!(output.contains("2533"), "got: {output}");
        assert_eq!(state.last_assistant_message(), Some("The result is 2533."));
    }

    #[tokio::test]
    async fn response_alongside_directive_ends_after_one_iteration() {
        // Tool output and a non-empty response in the same round: the policy
        // finalizes with that response rather than looping again.
        let llm = MockLlmClient::scripted(vec![Ok(format!(
            "Working on it.\n{}",
            directive("calculate", "expression", "1 + 1")
        ))]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("What is 1 + 1?");

        agent.run_turn(&mut state).await;

        assert_eq!(state.iteration_count, 1);
        assert_eq!(state.last_assistant_message(), Some("Working on it."));
        assert!(state.tool_calls.iter().all(|t| !t.is_pending()));
    }

    #[tokio::test]
    async fn unknown_tool_resolves_and_turn_terminates() {
        let llm = MockLlmClient::scripted(vec![
            Ok(directive("fly_me_to_mars", "destination", "Mars")),
            Ok("That tool isn't available, sorry.".to_string()),
        ]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("Fly me to Mars");

        agent.run_turn(&mut state).await;

        assert!(state.iteration_count <= CEILING);
        assert_eq!(
            state.tool_calls[0].tool_output.as_deref(),
            Some("Tool 'fly_me_to_mars' is not available")
        );
        assert_eq!(
            state.last_assistant_message(),
            Some("That tool isn't available, sorry.")
        );
    }

    #[tokio::test]
    async fn endless_tool_requests_hit_the_ceiling() {
        let llm = MockLlmClient::repeating(directive("calculate", "expression", "1 + 1"));
        let agent = calculator_agent(llm);
        let mut state = state_with_query("loop forever");

        agent.run_turn(&mut state).await;

        assert_eq!(state.iteration_count, CEILING);
        // One tool call per iteration, all resolved eagerly.
        assert_eq!(state.tool_calls.len(), CEILING as usize);
        assert!(state.tool_calls.iter().all(|t| !t.is_pending()));
    }

    #[tokio::test]
    async fn ceiling_appends_last_response_when_present() {
        let llm = MockLlmClient::repeating(format!(
            "Still thinking.\n{}",
            directive("fly_me_to_mars", "destination", "Mars")
        ));
        // Non-empty response each round ends the turn at iteration 1 via the
        // executed-with-response rule, so force the ceiling path with a
        // 1-iteration budget.
        let tools = ToolRegistry::with_defaults(&Config::new(None));
        let agent = Agent::with_client(Arc::new(llm), tools, 1);
        let mut state = state_with_query("anything");

        agent.run_turn(&mut state).await;

        assert_eq!(state.iteration_count, 1);
        assert_eq!(state.last_assistant_message(), Some("Still thinking."));
    }

    #[tokio::test]
    async fn malformed_directive_preserves_surrounding_text() {
        let llm = MockLlmClient::scripted(vec![Ok(
            "Here you go.\n```tool\nnot json\n```".to_string()
        )]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("hello");

        agent.run_turn(&mut state).await;

        assert!(state.tool_calls.is_empty());
        assert_eq!(state.iteration_count, 1);
        assert_eq!(state.last_assistant_message(), Some("Here you go."));
    }

    #[tokio::test]
    async fn identical_directives_resolve_independently() {
        let block = directive("calculate", "expression", "2 + 2");
        let llm = MockLlmClient::scripted(vec![
            Ok(format!("{block}\n{block}")),
            Ok("Both say 4.".to_string()),
        ]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("twice please");

        agent.run_turn(&mut state).await;

        assert_eq!(state.tool_calls.len(), 2);
        let tool_messages: Vec<_> = state
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 2);
        assert_ne!(
            tool_messages[0].tool_call_id, tool_messages[1].tool_call_id,
            "tool message ids must be unique within the conversation"
        );
        assert_eq!(tool_messages[0].content, tool_messages[1].content);
    }

    #[tokio::test]
    async fn model_failure_degrades_to_fallback_response() {
        let llm = MockLlmClient::scripted(vec![Err("connection refused".to_string())]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("hello");

        agent.run_turn(&mut state).await;

        assert_eq!(state.iteration_count, 1);
        assert!(state.tool_calls.is_empty());
        assert_eq!(state.last_assistant_message(), Some(NO_RESPONSE_FALLBACK));
    }

    #[tokio::test]
    async fn direct_answer_ends_without_tools() {
        let llm = MockLlmClient::scripted(vec![Ok("Just an answer.".to_string())]);
        let agent = calculator_agent(llm);
        let mut state = state_with_query("hi");

        agent.run_turn(&mut state).await;

        assert_eq!(state.iteration_count, 1);
        assert!(state.tool_calls.is_empty());
        assert_eq!(state.last_assistant_message(), Some("Just an answer."));
    }

    #[tokio::test]
    async fn iteration_count_never_exceeds_ceiling() {
        for script in [
            MockLlmClient::repeating(directive("calculate", "expression", "1")),
            MockLlmClient::repeating(directive("nope", "x", "y")),
            MockLlmClient::scripted(vec![]),
        ] {
            let agent = calculator_agent(script);
            let mut state = state_with_query("anything");
            agent.run_turn(&mut state).await;
            assert!(state.iteration_count <= CEILING);
        }
    }
}
