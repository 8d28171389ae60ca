//! Pull a JSON object out of free-form model output
//!
//! Models often wrap the requested JSON in prose or code fences:
//!
//! ````text
//! Sure! Here is the translation:
//! ```json
//! { "fr": { "title": "Bonjour" } }
//! ```
//! ````
//!
//! [`extract_json_object`] returns the first balanced `{ ... }` span, skipping
//! braces that appear inside string literals.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no JSON object found in response")]
    NoJson,
    #[error("JSON object starting at byte {0} is never closed")]
    Unbalanced(usize),
    #[error("invalid JSON object: {0}")]
    Invalid(String),
}

/// Return the first balanced brace-delimited substring of `text`.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoJson)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().copied().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::Unbalanced(start))
}

/// Extract the first balanced object and parse it.
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let candidate = extract_json_object(text)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractError::Invalid("not an object".to_string())),
        Err(e) => Err(ExtractError::Invalid(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_surrounding_prose() {
        let text = "Here you go:\n{\"fr\": {\"hi\": \"Salut\"}}\nLet me know!";
        assert_eq!(
            extract_json_object(text).unwrap(),
            "{\"fr\": {\"hi\": \"Salut\"}}"
        );
    }

    #[test]
    fn test_code_fence() {
        let text = "```json\n{\"a\": {\"b\": \"c\"}}\n```";
        let parsed = parse_json_object(text).unwrap();
        assert_eq!(Value::Object(parsed), json!({ "a": { "b": "c" } }));
    }

    #[test]
    fn test_stops_at_first_balanced_object() {
        let text = r#"{"a": 1} and later {"b": 2}"#;
        assert_eq!(extract_json_object(text).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let text = r#"{"greeting": "Hello {name}", "close": "}"} trailing }"#;
        let parsed = parse_json_object(text).unwrap();
        assert_eq!(parsed["greeting"], json!("Hello {name}"));
        assert_eq!(parsed["close"], json!("}"));
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let text = r#"{"quote": "She said \"{hi}\"", "n": 1}"#;
        let parsed = parse_json_object(text).unwrap();
        assert_eq!(parsed["n"], json!(1));
    }

    #[test]
    fn test_multibyte_text_around_object() {
        let text = "翻译如下：{\"zh\": {\"title\": \"你好\"}}。";
        let parsed = parse_json_object(text).unwrap();
        assert_eq!(parsed["zh"]["title"], json!("你好"));
    }

    #[test]
    fn test_no_object() {
        assert_eq!(
            extract_json_object("I cannot help with that."),
            Err(ExtractError::NoJson)
        );
    }

    #[test]
    fn test_unbalanced_object() {
        assert_eq!(
            extract_json_object("ok: {\"a\": {\"b\": 1}"),
            Err(ExtractError::Unbalanced(4))
        );
    }

    #[test]
    fn test_balanced_but_invalid() {
        assert!(matches!(
            parse_json_object("{not json}"),
            Err(ExtractError::Invalid(_))
        ));
    }
}
