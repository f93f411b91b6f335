use crate::convert::DocumentConverter;
use crate::error::{Result, SinkError};
use crate::types::{Document, Record};

/// A single index mutation derived from one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Upsert { document: Document },
    Delete { key: String },
}

impl Operation {
    /// Classify a record.
    ///
    /// A present value becomes an upsert (the key, when present, fills in a
    /// missing unique key field). An absent value with a key becomes a delete.
    /// A record with neither is rejected: it can only come from a malformed
    /// producer.
    pub fn from_record<C: DocumentConverter + ?Sized>(
        record: &Record,
        converter: &C,
    ) -> Result<Self> {
        match (&record.value, &record.key) {
            (Some(value), key) => {
                let mut document = converter.convert(value).map_err(|e| match e {
                    SinkError::InvalidDocument(msg) => SinkError::InvalidDocument(format!(
                        "{}-{}@{}: {}",
                        record.topic, record.partition, record.offset, msg
                    )),
                    other => other,
                })?;
                if let Some(key) = key {
                    document.set_id_if_absent(key);
                }
                Ok(Operation::Upsert { document })
            }
            (None, Some(key)) => Ok(Operation::Delete { key: key.clone() }),
            (None, None) => Err(SinkError::InvalidRecord(format!(
                "{}-{}@{} has neither key nor value",
                record.topic, record.partition, record.offset
            ))),
        }
    }

    pub fn is_upsert(&self) -> bool {
        matches!(self, Operation::Upsert { .. })
    }
}
