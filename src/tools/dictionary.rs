//! Dictionary lookup tool.
//!
//! Resolution order: Wordnik (when a key is configured), a small built-in
//! glossary of domain terms, then the free dictionaryapi.dev endpoint. Lookup
//! misses and network failures both surface as a polite "couldn't find" text.

use async_trait::async_trait;
use serde_json::Value;

use super::Tool;

const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    ("gemini", "A family of multimodal large language models developed by Google DeepMind."),
    ("tool use", "The capability of AI systems to use external tools to accomplish tasks."),
    ("api", "Application Programming Interface - a set of rules that allow different software applications to communicate with each other."),
    ("frontend", "The part of a website or application that users interact with directly."),
    ("backend", "The server-side of a website or application that works behind the scenes."),
    ("rust", "A systems programming language focused on safety, speed, and concurrency."),
    ("agent", "A program that perceives its environment and takes actions to achieve goals, often by invoking external tools."),
    ("json", "JavaScript Object Notation - a lightweight text format for structured data interchange."),
];

/// Look up the definition of a term or word using dictionary APIs.
pub struct LookupDefinition {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl LookupDefinition {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self { api_key, client }
    }

    fn builtin(&self, term: &str) -> Option<String> {
        let needle = term.to_lowercase();
        BUILTIN_DEFINITIONS
            .iter()
            .find(|(key, _)| *key == needle)
            .map(|(_, definition)| format!("{}: {}", term, definition))
    }

    async fn wordnik(&self, term: &str, api_key: &str) -> Option<String> {
        let url = format!("https://api.wordnik.com/v4/word.json/{}/definitions", term);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("limit", "3"),
                ("useCanonical", "true"),
                ("sourceDictionaries", "all"),
                ("api_key", api_key),
            ])
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let data: Value = response.json().await.ok()?;
        let first = data.as_array()?.first()?;
        let definition = first["text"].as_str()?;
        let part_of_speech = first["partOfSpeech"].as_str().unwrap_or("");
        Some(format!("{} ({}): {}", term, part_of_speech, definition))
    }

    async fn free_dictionary(&self, term: &str) -> Option<String> {
        let url = format!("https://api.dictionaryapi.dev/api/v2/entries/en/{}", term);
        let response = self.client.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }

        let data: Value = response.json().await.ok()?;
        let meaning = data.as_array()?.first()?.get("meanings")?.as_array()?.first()?;
        let definition = meaning
            .get("definitions")?
            .as_array()?
            .first()?
            .get("definition")?
            .as_str()?;
        let part_of_speech = meaning["partOfSpeech"].as_str().unwrap_or("");
        Some(format!("{} ({}): {}", term, part_of_speech, definition))
    }
}

#[async_trait]
impl Tool for LookupDefinition {
    fn name(&self) -> &str {
        "lookup_definition"
    }

    fn description(&self) -> &str {
        "Look up the definition of a term or word using dictionary APIs"
    }

    fn parameter(&self) -> &str {
        "term"
    }

    async fn invoke(&self, argument: &str) -> anyhow::Result<String> {
        if let Some(api_key) = self.api_key.clone() {
            if let Some(text) = self.wordnik(argument, &api_key).await {
                return Ok(text);
            }
        } else if let Some(text) = self.builtin(argument) {
            return Ok(text);
        }

        if let Some(text) = self.free_dictionary(argument).await {
            return Ok(text);
        }

        Ok(format!("Sorry, I couldn't find a definition for '{}'.", argument))
    }
}
