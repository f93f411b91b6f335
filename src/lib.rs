//! Streams keyed change records into a Solr-style search cluster.
//!
//! Records are grouped per destination collection, classified into upserts
//! and deletes, and dispatched in arrival order. Missing collections can be
//! created on first use. Failures come back as a typed [`DispatchError`] so
//! the caller knows whether redelivering the same batch is safe.
//!
//! ```no_run
//! use solr_sink::{InMemoryCluster, Record, SinkConfig, SinkTask};
//!
//! # async fn run() -> Result<(), solr_sink::DispatchError> {
//! let cluster = InMemoryCluster::new();
//! let mut task = SinkTask::new(SinkConfig::default(), cluster.clone(), cluster);
//! let records = vec![Record::new("products", Some("p1"), Some(serde_json::json!({"title": "Pan"})))];
//! task.process_batch(&records).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod memory;
pub mod sink;
pub mod transport;
pub mod types;

pub use config::{CollectionPolicy, SinkConfig};
pub use convert::{DocumentConverter, JsonDocumentConverter};
pub use error::{DispatchError, Result, SinkError};
pub use memory::InMemoryCluster;
pub use sink::{DestinationBatch, ExistenceCache, Operation, SinkTask};
pub use transport::{AdminTransport, DispatchTransport, UpdateRequest};
pub use types::{Document, FieldValue, Record};
