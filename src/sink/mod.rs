//! Record ingestion: classification, per-destination batching, assure-exists
//! and ordered dispatch.

pub mod batch;
pub mod existence;
pub mod operation;
pub mod task;

pub use batch::{DestinationBatch, UpdateRequests};
pub use existence::ExistenceCache;
pub use operation::Operation;
pub use task::SinkTask;
