use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Name of the unique key field in a collection.
pub const ID_FIELD: &str = "id";

/// A keyed change record as delivered by the upstream stream.
///
/// `topic` names the origin destination. `partition` and `offset` are only
/// carried along for logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub topic: String,
    #[serde(default)]
    pub partition: i32,
    #[serde(default)]
    pub offset: i64,
    #[serde(default, deserialize_with = "deserialize_key")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_value")]
    pub value: Option<serde_json::Value>,
}

impl Record {
    pub fn new(
        topic: impl Into<String>,
        key: Option<&str>,
        value: Option<serde_json::Value>,
    ) -> Self {
        Record {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            key: key.map(str::to_string),
            value: value.filter(|v| !v.is_null()),
        }
    }
}

/// Keys arrive as arbitrary JSON; use their string form the way the record
/// producer would print them. Strings are taken verbatim, `null` is absent.
fn deserialize_key<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn deserialize_value<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.filter(|v| !v.is_null()))
}

/// A document ready to be indexed, as an ordered set of named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub fields: IndexMap<String, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the unique key field, if it is present and scalar.
    pub fn id(&self) -> Option<String> {
        match self.fields.get(ID_FIELD)? {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Write `key` into the unique key field unless the document already has one.
    pub fn set_id_if_absent(&mut self, key: &str) {
        if !self.fields.contains_key(ID_FIELD) {
            self.fields
                .insert(ID_FIELD.to_string(), FieldValue::Text(key.to_string()));
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

pub fn json_value_to_field_value(val: &serde_json::Value) -> Option<FieldValue> {
    match val {
        serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(FieldValue::Integer(i))
            } else {
                n.as_f64().map(FieldValue::Float)
            }
        }
        serde_json::Value::Bool(b) => Some(FieldValue::Boolean(*b)),
        serde_json::Value::Array(arr) => {
            let items: Vec<FieldValue> = arr.iter().filter_map(json_value_to_field_value).collect();
            if items.is_empty() {
                None
            } else {
                Some(FieldValue::Array(items))
            }
        }
        serde_json::Value::Object(obj) => {
            let nested: IndexMap<String, FieldValue> = obj
                .iter()
                .filter_map(|(k, v)| json_value_to_field_value(v).map(|fv| (k.clone(), fv)))
                .collect();
            if nested.is_empty() {
                None
            } else {
                Some(FieldValue::Object(nested))
            }
        }
        serde_json::Value::Null => None,
    }
}

/// A dynamically-typed field value stored in a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Object(IndexMap<String, FieldValue>),
    Array(Vec<FieldValue>),
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_key_is_stringified() {
        let r: Record = serde_json::from_value(json!({"topic": "t", "key": 42})).unwrap();
        assert_eq!(r.key.as_deref(), Some("42"));

        let r: Record = serde_json::from_value(json!({"topic": "t", "key": "abc"})).unwrap();
        assert_eq!(r.key.as_deref(), Some("abc"));
    }

    #[test]
    fn record_null_key_and_value_are_absent() {
        let r: Record =
            serde_json::from_value(json!({"topic": "t", "key": null, "value": null})).unwrap();
        assert_eq!(r.key, None);
        assert_eq!(r.value, None);
        assert_eq!(r.partition, 0);
        assert_eq!(r.offset, 0);
    }

    #[test]
    fn record_new_drops_null_value() {
        let r = Record::new("t", Some("k"), Some(serde_json::Value::Null));
        assert_eq!(r.value, None);
    }

    #[test]
    fn document_id_from_text_or_integer() {
        let mut doc = Document::new();
        assert_eq!(doc.id(), None);
        doc.insert("id", FieldValue::Integer(7));
        assert_eq!(doc.id().as_deref(), Some("7"));
        doc.insert("id", FieldValue::Text("a".into()));
        assert_eq!(doc.id().as_deref(), Some("a"));
    }

    #[test]
    fn set_id_if_absent_keeps_existing() {
        let mut doc = Document::new();
        doc.insert("id", FieldValue::Text("from-value".into()));
        doc.set_id_if_absent("from-key");
        assert_eq!(doc.id().as_deref(), Some("from-value"));

        let mut doc = Document::new();
        doc.set_id_if_absent("from-key");
        assert_eq!(doc.id().as_deref(), Some("from-key"));
    }

    #[test]
    fn json_conversion_skips_nulls_and_keeps_bools() {
        let fv = json_value_to_field_value(&json!({"a": null, "b": true, "c": [1, null]})).unwrap();
        let FieldValue::Object(map) = fv else {
            panic!("expected object");
        };
        assert!(!map.contains_key("a"));
        assert_eq!(map["b"], FieldValue::Boolean(true));
        assert_eq!(map["c"], FieldValue::Array(vec![FieldValue::Integer(1)]));
    }

    #[test]
    fn document_serializes_flat_in_field_order() {
        let mut doc = Document::new();
        doc.insert("id", FieldValue::Text("1".into()));
        doc.insert("price", FieldValue::Float(9.5));
        let s = serde_json::to_string(&doc).unwrap();
        assert_eq!(s, r#"{"id":"1","price":9.5}"#);
    }
}
