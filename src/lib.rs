//! # Tool Agent
//!
//! A tool-using conversational agent exposed over HTTP.
//!
//! This library provides:
//! - An HTTP API for submitting queries and managing conversations
//! - An agent loop that alternates between model consultation and tool execution
//! - A small set of built-in tools (weather, web search, calculator, dictionary)
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a query via the API and append it to the conversation
//! 2. Ask the model what to do next, given the full history and tool list
//! 3. Parse any tool directives out of the response and execute them in order
//! 4. Feed results back to the model, repeat until a final answer is produced
//!    or the iteration ceiling is reached
//!
//! ## Example
//!
//! ```rust,ignore
//! use tool_agent::{config::Config, api};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod store;
pub mod tools;

pub use config::Config;
