use serde_json::Value;
use thiserror::Error;

use super::LlmResponse;

/// Why a model answer could not be turned into the target type
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoObject,

    #[error("JSON found in response but none of it describes the expected object")]
    NoMatchingObject,

    #[error("{0}")]
    SchemaMismatch(String),
}

/// Find the byte index of the `}` closing the object opened at `start`.
///
/// Braces inside string literals (including escaped quotes) do not count.
fn balanced_object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

/// Every balanced `{ ... }` span in the text, in order of their opening brace.
///
/// Each `{` is tried as a start, so a stray brace in prose never hides the
/// object that follows it.
pub fn json_object_candidates(text: &str) -> impl Iterator<Item = &str> + '_ {
    let bytes = text.as_bytes();
    text.match_indices('{').filter_map(move |(start, _)| {
        balanced_object_end(bytes, start).map(|end| &text[start..=end])
    })
}

/// Fix trailing commas in JSON (common LLM mistake)
///
/// Example: `{"name": "John",}` -> `{"name": "John"}`. Commas inside string
/// literals are left alone.
pub fn fix_trailing_commas(json_str: &str) -> String {
    let mut out = String::with_capacity(json_str.len());
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in json_str.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let closes = json_str[index + 1..]
                    .trim_start()
                    .starts_with(['}', ']']);
                if closes {
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
    }

    out
}

/// Parse a span as a JSON object, retrying once with trailing commas removed.
fn parse_object(span: &str) -> Option<Value> {
    let value = match serde_json::from_str::<Value>(span) {
        Ok(value) => value,
        Err(_) => {
            let fixed = fix_trailing_commas(span);
            if fixed == span {
                return None;
            }
            let value = serde_json::from_str::<Value>(&fixed).ok()?;
            tracing::debug!("JSON parsed after removing trailing commas");
            value
        }
    };

    value.is_object().then_some(value)
}

/// Decode the first JSON object in a model answer that looks like `T`.
///
/// Surrounding prose and markdown code fences are ignored. An object counts as
/// a match when it carries at least one of `T::identifying_keys()`. A matching
/// object that fails to decode does not end the scan; its error is returned
/// only when no later object decodes.
pub fn extract_response<T>(text: &str) -> Result<T, ParseError>
where
    T: LlmResponse,
{
    let mut parsed_any = false;
    let mut first_mismatch: Option<ParseError> = None;

    for span in json_object_candidates(text) {
        let Some(value) = parse_object(span) else {
            continue;
        };
        parsed_any = true;

        let matches = value.as_object().is_some_and(|object| {
            T::identifying_keys()
                .iter()
                .any(|key| object.contains_key(*key))
        });

        if !matches {
            tracing::debug!(
                "Skipping unrelated JSON object (first 100 chars): {}",
                span.chars().take(100).collect::<String>()
            );
            continue;
        }

        match serde_json::from_value::<T>(value) {
            Ok(response) => return Ok(response),
            Err(e) => {
                tracing::debug!("Matching JSON object did not decode: {}", e);
                first_mismatch.get_or_insert(ParseError::SchemaMismatch(e.to_string()));
            }
        }
    }

    if let Some(mismatch) = first_mismatch {
        Err(mismatch)
    } else if parsed_any {
        Err(ParseError::NoMatchingObject)
    } else {
        Err(ParseError::NoObject)
    }
}
