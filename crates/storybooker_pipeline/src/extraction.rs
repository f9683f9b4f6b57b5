//! Pulling JSON documents out of model replies.
//!
//! Models often wrap JSON in markdown fences or surround it with prose.

use storybooker_error::JsonError;

/// Extract a JSON document from a reply that may contain markdown or prose.
///
/// Tries a fenced ```json block, then the first balanced object or array,
/// whichever opens first.
///
/// # Examples
///
/// ```
/// use storybooker_pipeline::extract_json;
///
/// let reply = "Here you go:\n```json\n{\"title\": \"Moonlight\"}\n```";
/// assert_eq!(extract_json(reply).unwrap(), "{\"title\": \"Moonlight\"}");
/// ```
pub fn extract_json(response: &str) -> Result<String, JsonError> {
    if let Some(json) = extract_from_code_block(response) {
        return Ok(json);
    }

    let object_first = match (response.find('{'), response.find('[')) {
        (Some(brace), Some(bracket)) => brace < bracket,
        (Some(_), None) => true,
        _ => false,
    };
    let (first, second) = if object_first {
        (('{', '}'), ('[', ']'))
    } else {
        (('[', ']'), ('{', '}'))
    };
    if let Some(json) = extract_balanced(response, first.0, first.1)
        .or_else(|| extract_balanced(response, second.0, second.1))
    {
        return Ok(json);
    }

    tracing::debug!(response_length = response.len(), "No JSON found in model reply");
    Err(JsonError::new(format!(
        "No JSON found in response (length: {})",
        response.len()
    )))
}

/// Content of the first fenced block, preferring one tagged `json`.
///
/// An unterminated fence yields everything after it.
fn extract_from_code_block(response: &str) -> Option<String> {
    let (start, tag_len) = match response.find("```json") {
        Some(start) => (start, "```json".len()),
        None => (response.find("```")?, 3),
    };
    let after = &response[start + tag_len..];
    let body = match after.find('\n') {
        Some(newline) if tag_len == 3 => &after[newline + 1..],
        _ => after,
    };
    let content = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let content = content.trim();
    (!content.is_empty()).then(|| content.to_string())
}

/// First `open`..`close` span with balanced nesting, ignoring delimiters in strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and deserialize a JSON reply.
pub fn parse_json<T>(response: &str) -> Result<T, JsonError>
where
    T: serde::de::DeserializeOwned,
{
    let json = extract_json(response)?;
    serde_json::from_str(&json).map_err(|e| {
        let preview: String = json.chars().take(100).collect();
        tracing::debug!(error = %e, json_preview = %preview, "JSON parsing failed");
        JsonError::new(format!("Failed to parse JSON: {} (JSON: {}...)", e, preview))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_untagged_fence() {
        let reply = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(reply).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_balanced_with_prose_and_nesting() {
        let reply = r#"Sure! {"beats": [{"text": "a } inside"}]} Enjoy."#;
        assert_eq!(
            extract_json(reply).unwrap(),
            r#"{"beats": [{"text": "a } inside"}]}"#
        );
    }

    #[test]
    fn test_array_first() {
        let reply = r#"[{"name": "Pip"}] and {"x": 1}"#;
        assert!(extract_json(reply).unwrap().starts_with('['));
    }

    #[test]
    fn test_escaped_quotes() {
        let reply = r#"{"text": "She said \"hi\""}"#;
        assert_eq!(extract_json(reply).unwrap(), reply);
    }

    #[test]
    fn test_plain_text_is_error() {
        assert!(extract_json("once upon a time").is_err());
    }

    #[test]
    fn test_truncated_fence() {
        let reply = "```json\n{\"a\": 2}";
        assert_eq!(extract_json(reply).unwrap(), "{\"a\": 2}");
    }
}
