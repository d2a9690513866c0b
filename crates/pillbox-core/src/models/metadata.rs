//! Opaque metadata attached to patients, medications, schedules and events.
//!
//! The core never interprets metadata. It only guarantees that whatever is
//! stored decodes to a key-value mapping, and that an absent value decodes
//! to an empty mapping rather than to nothing.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key-value mapping with dynamically typed values (string, number,
/// boolean, null, nested mapping, nested sequence).
pub type Metadata = Map<String, Value>;

/// Metadata decode errors.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("malformed metadata JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("metadata must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Decode stored metadata text.
///
/// `None`, blank text and JSON `null` all decode to an empty mapping.
pub fn decode_metadata(raw: Option<&str>) -> Result<Metadata, MetadataError> {
    let text = match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(Metadata::new()),
    };

    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Metadata::new()),
        other => Err(MetadataError::NotAnObject(value_kind(&other))),
    }
}

/// Encode metadata for storage.
pub fn encode_metadata(metadata: &Metadata) -> String {
    Value::Object(metadata.clone()).to_string()
}

fn value_kind(value: &Value) -> &'static str {
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

    #[test]
    fn test_absent_decodes_empty() {
        assert!(decode_metadata(None).unwrap().is_empty());
        assert!(decode_metadata(Some("")).unwrap().is_empty());
        assert!(decode_metadata(Some("  ")).unwrap().is_empty());
        assert!(decode_metadata(Some("null")).unwrap().is_empty());
    }

    #[test]
    fn test_nested_object() {
        let meta = decode_metadata(Some(r#"{"tray": {"slot": 3}, "tags": ["am", 1, true]}"#)).unwrap();
        assert_eq!(meta["tray"], json!({"slot": 3}));
        assert_eq!(meta["tags"], json!(["am", 1, true]));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = decode_metadata(Some("[1, 2]")).unwrap_err();
        assert!(matches!(err, MetadataError::NotAnObject("array")));

        let err = decode_metadata(Some("\"text\"")).unwrap_err();
        assert!(matches!(err, MetadataError::NotAnObject("string")));
    }

    #[test]
    fn test_malformed_rejected() {
        let err = decode_metadata(Some("{not json")).unwrap_err();
        assert!(matches!(err, MetadataError::Malformed(_)));
    }

    #[test]
    fn test_encode_decode() {
        let mut meta = Metadata::new();
        meta.insert("color_hint".into(), json!("blue"));
        let decoded = decode_metadata(Some(&encode_metadata(&meta))).unwrap();
        assert_eq!(decoded, meta);
    }
}
