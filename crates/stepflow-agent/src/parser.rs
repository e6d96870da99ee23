//! Model output parsing.
//!
//! Model replies are untrusted text. The parser tries a sequence of
//! strategies, strictest first: whole-output JSON, a fenced code block, a
//! balanced JSON object embedded in prose (with trailing-comma repair),
//! and finally a plain `Final Answer:` line. A JSON object naming both a
//! tool call and a final answer is treated as a tool call.

use serde_json::{json, Value};

use stepflow_protocols::error::ParseError;

/// A parsed request to invoke a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Name of the tool to invoke.
    pub tool_name: String,

    /// Input to pass to the tool.
    pub tool_input: Value,
}

/// What the model asked for in one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationResult {
    /// Invoke a tool and continue the loop.
    ToolInvocation(ToolCall),

    /// Finish the run with this answer.
    FinalAnswer { text: String },
}

/// Parse raw model output into an [`IterationResult`].
pub fn parse_output(raw: &str) -> Result<IterationResult, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyOutput);
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(result) = interpret(&value) {
            return Ok(result);
        }
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Some(result) = parse_candidate(block.trim()) {
            return Ok(result);
        }
    }

    if let Some(candidate) = balanced_object(trimmed) {
        if let Some(result) = parse_candidate(candidate) {
            return Ok(result);
        }
    }

    if let Some(text) = final_answer_text(trimmed) {
        return Ok(IterationResult::FinalAnswer { text });
    }

    if trimmed.contains('{') {
        Err(ParseError::InvalidJson(excerpt(trimmed)))
    } else {
        Err(ParseError::MissingAction)
    }
}

/// Parse a JSON candidate, repairing trailing commas on a second attempt.
fn parse_candidate(candidate: &str) -> Option<IterationResult> {
    let value = serde_json::from_str::<Value>(candidate)
        .or_else(|_| serde_json::from_str::<Value>(&strip_trailing_commas(candidate)))
        .ok()?;
    interpret(&value)
}

/// Map a parsed JSON value to an iteration result.
///
/// `tool_name` takes precedence over `final_answer` when both are present.
fn interpret(value: &Value) -> Option<IterationResult> {
    let object = value.as_object()?;

    if let Some(tool_name) = object.get("tool_name").and_then(Value::as_str) {
        let tool_input = object.get("tool_input").cloned().unwrap_or_else(|| json!({}));
        return Some(IterationResult::ToolInvocation(ToolCall {
            tool_name: tool_name.to_string(),
            tool_input,
        }));
    }

    if let Some(answer) = object.get("final_answer") {
        let text = match answer.as_str() {
            Some(text) => text.to_string(),
            None => answer.to_string(),
        };
        return Some(IterationResult::FinalAnswer { text });
    }

    None
}

/// Extract the contents of the first fenced code block, skipping any
/// language tag on the opening fence.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// Find the first balanced `{...}` object in the text, honoring string
/// literals and escapes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove commas that directly precede a closing brace or bracket, outside
/// of string literals.
fn strip_trailing_commas(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in candidate.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = !in_string;
                out.push(ch);
            }
            '}' | ']' if !in_string => {
                while out.ends_with(|c: char| c.is_whitespace()) {
                    out.pop();
                }
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Extract the answer following a `Final Answer:` marker, joining any
/// lines that follow it.
fn final_answer_text(text: &str) -> Option<String> {
    const MARKER: &str = "final answer:";

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        let matches_marker = trimmed
            .get(..MARKER.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MARKER));
        if matches_marker {
            let mut parts = vec![trimmed[MARKER.len()..].trim()];
            parts.extend(text.lines().skip(idx + 1).map(str::trim));
            let answer = parts.join("\n").trim().to_string();
            return Some(answer);
        }
    }
    None
}

/// Cap error excerpts so a long reply does not flood logs.
fn excerpt(text: &str) -> String {
    const MAX: usize = 120;
    if text.len() <= MAX {
        text.to_string()
    } else {
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
