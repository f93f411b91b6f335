//! Solr transport for `solr-sink`: collections admin API plus direct and
//! buffered update dispatch over HTTP.

pub mod buffered;
pub mod client;
pub mod config;
pub mod types;

pub use buffered::BufferedDispatcher;
pub use client::SolrClient;
pub use config::{DispatchMode, SolrConfig};
