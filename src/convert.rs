//! Conversion of record values into indexable documents.

use crate::error::{Result, SinkError};
use crate::types::{json_value_to_field_value, Document, FieldValue};

/// Turns a record value into a [`Document`]. Must be free of side effects;
/// it is never called for deletes.
pub trait DocumentConverter {
    fn convert(&self, value: &serde_json::Value) -> Result<Document>;
}

/// Converts JSON objects field by field. A string value is treated as a
/// serialized payload and parsed first.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentConverter;

impl DocumentConverter for JsonDocumentConverter {
    fn convert(&self, value: &serde_json::Value) -> Result<Document> {
        let parsed;
        let value = match value {
            serde_json::Value::String(raw) => {
                parsed = serde_json::from_str::<serde_json::Value>(raw).map_err(|e| {
                    SinkError::InvalidDocument(format!("value is not a JSON payload: {}", e))
                })?;
                &parsed
            }
            other => other,
        };

        let obj = value.as_object().ok_or_else(|| {
            SinkError::InvalidDocument(format!(
                "expected JSON object, got {}",
                json_type_name(value)
            ))
        })?;

        let mut doc = Document::new();
        for (name, val) in obj {
            if let Some(field_value) = json_value_to_field_value(val) {
                doc.insert(name.clone(), field_value);
            }
        }
        Ok(doc)
    }
}

impl<F> DocumentConverter for F
where
    F: Fn(&serde_json::Value) -> Result<Document>,
{
    fn convert(&self, value: &serde_json::Value) -> Result<Document> {
        self(value)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Shorthand used by tests and the in-memory cluster.
pub fn text_document(fields: &[(&str, &str)]) -> Document {
    let mut doc = Document::new();
    for (name, value) in fields {
        doc.insert(*name, FieldValue::Text(value.to_string()));
    }
    doc
}
