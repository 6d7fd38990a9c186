use crate::data_structures::Conversation;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a list of conversations, got {0}")]
    NotASequence(&'static str),
}

pub struct ConversationLoader;

impl ConversationLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Conversation>, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let json: Value = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let conversations = self.parse_export(json)?;
        debug!(
            path = %path.display(),
            count = conversations.len(),
            "Loaded conversations"
        );
        Ok(conversations)
    }

    /// Accepts only a top-level array. Elements that do not look like a
    /// conversation are logged and dropped.
    pub fn parse_export(&self, json: Value) -> Result<Vec<Conversation>, LoadError> {
        let items = match json {
            Value::Array(items) => items,
            other => return Err(LoadError::NotASequence(json_type_name(&other))),
        };

        let mut conversations = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Conversation>(item) {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed conversation");
                }
            }
        }

        Ok(conversations)
    }
}

impl Default for ConversationLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let loader = ConversationLoader::new();
        let mut temp_file = NamedTempFile::new().unwrap();

        let content = r#"[
            {"title": "One", "id": "c1", "create_time": 1700000000.0, "mapping": {}, "current_node": null},
            {"title": "Two", "id": "c2", "create_time": 1700100000.5, "mapping": {"n": {"parent": null}}, "current_node": "n"}
        ]"#;
        temp_file.write_all(content.as_bytes()).unwrap();

        let conversations = loader.load_from_file(temp_file.path()).unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[0].title(), "One");
        assert_eq!(conversations[1].id(), "c2");
        assert_eq!(conversations[1].current_node(), Some("n"));
    }

    #[test]
    fn test_missing_file() {
        let loader = ConversationLoader::new();
        let err = loader
            .load_from_file("/definitely/not/here/conversations.json")
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn test_top_level_object_rejected() {
        let loader = ConversationLoader::new();
        let err = loader.parse_export(json!({"conversations": []})).unwrap_err();
        assert!(matches!(err, LoadError::NotASequence("object")));
        assert_eq!(err.to_string(), "Expected a list of conversations, got object");
    }

    #[test]
    fn test_invalid_json() {
        let loader = ConversationLoader::new();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[{\"title\": ").unwrap();

        let err = loader.load_from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let loader = ConversationLoader::new();
        let conversations = loader
            .parse_export(json!([
                {"title": "good", "mapping": {}},
                "not a conversation",
                {"title": "bad mapping", "mapping": [1, 2, 3]},
                {"title": "also good"}
            ]))
            .unwrap();
        assert_eq!(conversations.len(), 2);
        assert_eq!(conversations[1].title(), "also good");
    }

    #[test]
    fn test_mapping_keeps_document_order() {
        let loader = ConversationLoader::new();
        let conversations = loader
            .parse_export(
                serde_json::from_str(r#"[{"mapping": {"z": {}, "a": {}, "m": {}}}]"#).unwrap(),
            )
            .unwrap();
        let keys: Vec<&str> = conversations[0].mapping().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
