//! Tool-directive parsing.
//!
//! The model requests a tool with a fenced block: a line opening with
//! ` ```tool `, a JSON payload such as
//! `{"name": "calculate", "input": {"expression": "2 + 2"}}`, and a closing
//! ` ``` ` fence.
//!
//! The payload must be a JSON object with both `name` (string) and `input`
//! (object). Anything else inside a fence is an explicit "no directive"
//! result: the block is still stripped from the text, but no tool call is
//! produced. This leniency is deliberate; malformed directives are never
//! surfaced as errors.

use serde_json::{Map, Value};

const FENCE_OPEN: &str = "```tool";
const FENCE_CLOSE: &str = "```";

/// A parsed tool directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub input: Map<String, Value>,
}

/// Extract all tool directives from model output.
///
/// Returns the directives in order of appearance plus the text with every
/// directive block removed and trimmed. An unterminated fence is left in
/// place untouched.
pub fn extract_directives(content: &str) -> (Vec<Directive>, String) {
    let mut directives = Vec::new();
    let mut stripped = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find(FENCE_OPEN) {
        let after_open = &rest[start + FENCE_OPEN.len()..];
        let Some(end) = after_open.find(FENCE_CLOSE) else {
            break;
        };

        stripped.push_str(&rest[..start]);
        if let Some(directive) = parse_payload(&after_open[..end]) {
            directives.push(directive);
        }
        rest = &after_open[end + FENCE_CLOSE.len()..];
    }

    stripped.push_str(rest);
    (directives, stripped.trim().to_string())
}

/// Parse one fence payload. Invalid JSON or missing `name`/`input` keys mean
/// "no directive".
fn parse_payload(payload: &str) -> Option<Directive> {
    let value: Value = serde_json::from_str(payload.trim()).ok()?;
    let object = value.as_object()?;
    let name = object.get("name")?.as_str()?.to_string();
    let input = object.get("input")?.as_object()?.clone();
    Some(Directive { name, input })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_single_directive_and_strips_block() {
        let content = "Let me check.\n```tool\n{\"name\": \"get_weather\", \"input\": {\"location\": \"Paris\"}}\n```\nOne moment.";
        let (directives, text) = extract_directives(content);

        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].name, "get_weather");
        assert_eq!(directives[0].input.get("location"), Some(&json!("Paris")));
        assert_eq!(text, "Let me check.\n\nOne moment.");
    }

    #[test]
    fn parses_multiple_directives_in_order() {
        let content = "```tool\n{\"name\": \"a\", \"input\": {}}\n```\n```tool\n{\"name\": \"b\", \"input\": {}}\n```";
        let (directives, text) = extract_directives(content);

        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].name, "a");
        assert_eq!(directives[1].name, "b");
        assert!(text.is_empty());
    }

    #[test]
    fn invalid_json_yields_no_directive_but_strips_block() {
        let content = "Before.\n```tool\nnot json at all\n```\nAfter.";
        let (directives, text) = extract_directives(content);

        assert!(directives.is_empty());
        assert_eq!(text, "Before.\n\nAfter.");
    }

    #[test]
    fn missing_name_or_input_is_dropped() {
        let only_name = "```tool\n{\"name\": \"calculate\"}\n```";
        let (directives, _) = extract_directives(only_name);
        assert!(directives.is_empty());

        let only_input = "```tool\n{\"input\": {\"expression\": \"1\"}}\n```";
        let (directives, _) = extract_directives(only_input);
        assert!(directives.is_empty());

        let input_not_object = "```tool\n{\"name\": \"calculate\", \"input\": 5}\n```";
        let (directives, _) = extract_directives(input_not_object);
        assert!(directives.is_empty());
    }

    #[test]
    fn unterminated_fence_is_preserved() {
        let content = "Start ```tool\n{\"name\": \"a\"";
        let (directives, text) = extract_directives(content);

        assert!(directives.is_empty());
        assert_eq!(text, content.trim());
    }

    #[test]
    fn plain_text_passes_through() {
        let (directives, text) = extract_directives("Just an answer.");
        assert!(directives.is_empty());
        assert_eq!(text, "Just an answer.");
    }
}
