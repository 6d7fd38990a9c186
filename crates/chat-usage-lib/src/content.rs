//! Normalization of message content into plain text.
//!
//! Exports carry content in several shapes: a bare string, an object with a
//! `parts` list, an object with a `text` field, a list of strings, or some
//! object nobody anticipated. [`Content`] gives each shape its own variant and
//! [`extract_text`] turns any of them into a single string.

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Value")]
pub enum Content {
    /// `null`, `false`, `0`, `""`, `{}`, `[]` or a missing field.
    #[default]
    Empty,
    Text(String),
    Parts(Vec<ContentPart>),
    /// An object without a `parts` list but with a string `text` field.
    TextField(String),
    /// An object of any other shape, kept so it can be serialized verbatim.
    Unrecognized(Map<String, Value>),
    /// The string elements of a list; other elements are dropped on the way in.
    Strings(Vec<String>),
    /// `true`, non-zero numbers.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Object {
        text: Option<String>,
        content: Option<String>,
    },
    Text(String),
    /// Numbers, booleans, `null` and nested lists, already rendered.
    Scalar(String),
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        if is_falsy(&value) {
            return Content::Empty;
        }

        match value {
            Value::String(text) => Content::Text(text),
            Value::Object(mut map) => {
                if let Some(Value::Array(parts)) = map.get_mut("parts") {
                    let parts = std::mem::take(parts);
                    return Content::Parts(parts.into_iter().map(ContentPart::from).collect());
                }
                match map.get("text") {
                    Some(Value::String(text)) => Content::TextField(text.clone()),
                    _ => Content::Unrecognized(map),
                }
            }
            Value::Array(items) => Content::Strings(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Content::Other,
        }
    }
}

impl From<Value> for ContentPart {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ContentPart::Object {
                text: string_field(&map, "text"),
                content: string_field(&map, "content"),
            },
            Value::String(text) => ContentPart::Text(text),
            Value::Array(_) => ContentPart::Scalar(to_spaced_json(&value)),
            other => ContentPart::Scalar(other.to_string()),
        }
    }
}

impl ContentPart {
    pub fn text(&self) -> &str {
        match self {
            ContentPart::Object { text, content } => text
                .as_deref()
                .filter(|t| !t.is_empty())
                .or_else(|| content.as_deref().filter(|c| !c.is_empty()))
                .unwrap_or(""),
            ContentPart::Text(text) | ContentPart::Scalar(text) => text,
        }
    }
}

/// Plain text for any content shape. Never fails.
pub fn extract_text(content: &Content) -> String {
    match content {
        Content::Empty | Content::Other => String::new(),
        Content::Text(text) | Content::TextField(text) => text.clone(),
        Content::Parts(parts) => parts
            .iter()
            .map(ContentPart::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Content::Unrecognized(map) => to_spaced_json(&Value::Object(map.clone())),
        Content::Strings(items) => items.join("\n"),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// JSON with `", "` and `": "` separators. Key order and non-ASCII text are
/// kept as they came in.
fn to_spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(value: Value) -> String {
        extract_text(&Content::from(value))
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(extract(json!("hello")), "hello");
    }

    #[test]
    fn test_parts_mixed_shapes() {
        let value = json!({"parts": ["a", {"text": "b"}, {"content": "c"}, 5]});
        assert_eq!(extract(value), "a\nb\nc\n5");
    }

    #[test]
    fn test_parts_skip_empty() {
        let value = json!({
            "content_type": "multimodal_text",
            "parts": ["", {"asset_pointer": "file-1"}, "caption", {"text": "", "content": "fallback"}]
        });
        assert_eq!(extract(value), "caption\nfallback");
    }

    #[test]
    fn test_null_part_uses_json_spelling() {
        assert_eq!(extract(json!({"parts": [null, "x"]})), "null\nx");
        assert_eq!(extract(json!({"parts": [true, [1, "a"]]})), "true\n[1, \"a\"]");
    }

    #[test]
    fn test_parts_win_over_text_field() {
        let value = json!({"text": "ignored", "parts": ["used"]});
        assert_eq!(extract(value), "used");
    }

    #[test]
    fn test_text_field() {
        assert_eq!(extract(json!({"text": "x"})), "x");
        assert_eq!(
            extract(json!({"content_type": "code", "language": "python", "text": "print(1)"})),
            "print(1)"
        );
    }

    #[test]
    fn test_non_list_parts_falls_through_to_text() {
        assert_eq!(extract(json!({"parts": "nope", "text": "kept"})), "kept");
    }

    #[test]
    fn test_empty_shapes() {
        assert_eq!(extract(json!({})), "");
        assert_eq!(extract(json!(null)), "");
        assert_eq!(extract(json!("")), "");
        assert_eq!(extract(json!([])), "");
        assert_eq!(extract(json!(0)), "");
        assert_eq!(extract(json!(false)), "");
    }

    #[test]
    fn test_other_scalars_are_empty() {
        assert_eq!(extract(json!(42)), "");
        assert_eq!(extract(json!(true)), "");
    }

    #[test]
    fn test_list_keeps_only_strings() {
        assert_eq!(extract(json!(["x", 1, "y"])), "x\ny");
        assert_eq!(extract(json!([{"text": "no"}, 3])), "");
    }

    #[test]
    fn test_unrecognized_object_is_serialized() {
        let value = json!({"content_type": "tether_quote", "title": "Café", "score": 1.5, "tags": ["a", "b"]});
        assert_eq!(
            extract(value),
            r#"{"content_type": "tether_quote", "title": "Café", "score": 1.5, "tags": ["a", "b"]}"#
        );
    }

    #[test]
    fn test_unrecognized_object_escapes_quotes() {
        let value = json!({"result": "say \"hi\"\n"});
        assert_eq!(extract(value), r#"{"result": "say \"hi\"\n"}"#);
    }

    #[test]
    fn test_deserialize_from_message_field() {
        let content: Content = serde_json::from_str(r#"{"parts": ["hi", 2.5]}"#).unwrap();
        assert_eq!(
            content,
            Content::Parts(vec![
                ContentPart::Text("hi".to_string()),
                ContentPart::Scalar("2.5".to_string()),
            ])
        );
        assert_eq!(extract_text(&content), "hi\n2.5");
    }
}
