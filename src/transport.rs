//! Narrow interfaces to the search cluster.
//!
//! The core never talks to the network directly. Collection administration and
//! update dispatch are reached through these two traits so that direct and
//! buffered transports (and the in-memory cluster) are interchangeable.

use crate::error::Result;
use crate::types::Document;
use std::future::Future;

/// A dispatch-ready request: a maximal run of same-kind operations against
/// one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRequest {
    Add(Vec<Document>),
    Delete(Vec<String>),
}

impl UpdateRequest {
    /// Number of operations carried by this request.
    pub fn len(&self) -> usize {
        match self {
            UpdateRequest::Add(docs) => docs.len(),
            UpdateRequest::Delete(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpdateRequest::Add(_) => "add",
            UpdateRequest::Delete(_) => "delete",
        }
    }
}

/// Collection listing and creation.
pub trait AdminTransport {
    fn list_collections(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn create_collection(
        &self,
        name: &str,
        num_shards: u32,
        replication_factor: u32,
        max_shards_per_node: u32,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Applies update requests to a collection, in the order they are sent.
pub trait DispatchTransport {
    fn send(
        &mut self,
        collection: &str,
        request: &UpdateRequest,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Push out anything held back for `collection`. Called once per
    /// collection after its last `send` of a batch.
    fn flush(&mut self, collection: &str) -> impl Future<Output = Result<()>> + Send {
        let _ = collection;
        async { Ok(()) }
    }
}
