//! Model Decision Parsing
//!
//! Turns a raw completion into an explicit outcome so the orchestrator never
//! branches on prompt text directly.

use serde::Deserialize;
use serde_json::Value;

use crate::provider::Completion;
use crate::tool::ToolCall;

/// What the model asked for on the decision pass
#[derive(Clone, Debug)]
pub enum Decision {
    /// The model answered without selecting a tool
    DirectAnswer(String),
    /// The model selected a tool
    ToolRequest(ToolCall),
    /// The model tried to select a tool but the selection is unreadable
    ParseError(String),
}

/// `{"name": ..., "arguments": ...}` as emitted by the model
#[derive(Deserialize)]
struct Selection {
    #[serde(alias = "tool")]
    name: String,
    #[serde(default, alias = "args")]
    arguments: Value,
}

/// Classify a decision-pass completion.
///
/// Native function-calling tool calls take precedence. Otherwise a fenced
/// block or bare JSON object is read as a tool selection and must contain a
/// `name`; anything else is a direct answer.
pub fn parse_decision(completion: &Completion) -> Decision {
    if let Some(call) = completion.tool_calls.first() {
        if completion.tool_calls.len() > 1 {
            tracing::warn!(
                count = completion.tool_calls.len(),
                "Model requested several tools, dispatching the first"
            );
        }
        return Decision::ToolRequest(call.clone());
    }

    let content = completion.content.trim();
    if content.is_empty() {
        return Decision::ParseError("empty model response".into());
    }

    match selection_candidate(content) {
        Some(json) => parse_selection(json),
        None => Decision::DirectAnswer(content.to_string()),
    }
}

/// Locate the JSON text that is meant to be a tool selection, if any
fn selection_candidate(content: &str) -> Option<&str> {
    if let Some(inner) = fenced_block(content) {
        return Some(inner);
    }

    if content.starts_with('{') {
        return Some(object_span(content).unwrap_or(content));
    }

    if content.contains(r#""name""#) && content.contains(r#""arguments""#) {
        return object_span(content);
    }

    None
}

/// Body of the first ```tool, ```json or bare ``` block
fn fenced_block(content: &str) -> Option<&str> {
    let start = content.find("```")?;
    let after = &content[start + 3..];
    let body_start = after.find('\n').unwrap_or(0);
    let (label, rest) = after.split_at(body_start);

    let label = label.trim();
    if !(label.is_empty() || label == "tool" || label == "json") {
        return None;
    }

    let end = rest.find("```")?;
    let body = rest[..end].trim();

    // An unlabeled fence only counts when it holds an object
    if label.is_empty() && !body.starts_with('{') {
        return None;
    }
    Some(body)
}

fn object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn parse_selection(json: &str) -> Decision {
    let selection: Selection = match serde_json::from_str(json) {
        Ok(selection) => selection,
        Err(e) => return Decision::ParseError(format!("{e}: {json}")),
    };

    if selection.name.trim().is_empty() {
        return Decision::ParseError("tool selection has an empty name".into());
    }

    // Some models send arguments as an encoded JSON string
    let arguments = match selection.arguments {
        Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
            Ok(value) => value,
            Err(e) => return Decision::ParseError(format!("arguments are not JSON: {e}")),
        },
        other => other,
    };

    let call = ToolCall::new(selection.name, arguments)
        .with_id(uuid::Uuid::new_v4().to_string());
    Decision::ToolRequest(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(content: &str) -> Completion {
        Completion::text(content, "test")
    }

    #[test]
    fn test_prose_is_direct_answer() {
        let decision = parse_decision(&text("Bitcoin is a decentralized currency."));
        assert!(matches!(decision, Decision::DirectAnswer(a) if a.starts_with("Bitcoin")));
    }

    #[test]
    fn test_bare_json_selection() {
        let decision = parse_decision(&text(r#"{"name": "get_token_data", "arguments": {"coin": "solana"}}"#));
        let Decision::ToolRequest(call) = decision else {
            panic!("expected tool request");
        };
        assert_eq!(call.name, "get_token_data");
        assert_eq!(call.str_arg("coin"), Some("solana"));
        assert!(call.id.is_some());
    }

    #[test]
    fn test_fenced_tool_block() {
        let content = "Let me check.\n```tool\n{\"tool\": \"get_latest_news\", \"arguments\": {\"coin\": \"btc\"}}\n```";
        let Decision::ToolRequest(call) = parse_decision(&text(content)) else {
            panic!("expected tool request");
        };
        assert_eq!(call.name, "get_latest_news");
    }

    #[test]
    fn test_string_encoded_arguments() {
        let content = r#"{"name": "get_token_data", "arguments": "{\"coin\": \"eth\"}"}"#;
        let Decision::ToolRequest(call) = parse_decision(&text(content)) else {
            panic!("expected tool request");
        };
        assert_eq!(call.str_arg("coin"), Some("eth"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let decision = parse_decision(&text(r#"{"name": "get_token_data", "arguments": {"coin": }"#));
        assert!(matches!(decision, Decision::ParseError(_)));
    }

    #[test]
    fn test_json_without_name_is_parse_error() {
        let decision = parse_decision(&text(r#"{"arguments": {"coin": "sol"}}"#));
        assert!(matches!(decision, Decision::ParseError(_)));
    }

    #[test]
    fn test_native_tool_calls_take_precedence() {
        let mut completion = text("ignored");
        completion.tool_calls.push(ToolCall::new("get_token_data", json!({"coin": "sol"})));
        assert!(matches!(parse_decision(&completion), Decision::ToolRequest(c) if c.name == "get_token_data"));
    }

    #[test]
    fn test_empty_response_is_parse_error() {
        assert!(matches!(parse_decision(&text("   ")), Decision::ParseError(_)));
    }
}
