use super::batch::DestinationBatch;
use super::existence::ExistenceCache;
use super::operation::Operation;
use crate::config::SinkConfig;
use crate::convert::{DocumentConverter, JsonDocumentConverter};
use crate::error::DispatchError;
use crate::transport::{AdminTransport, DispatchTransport};
use crate::types::Record;
use indexmap::IndexMap;

/// One running sink task: turns batches of records into ordered index
/// mutations against the cluster.
///
/// Batches are processed one at a time (`process_batch` takes `&mut self`)
/// and nothing is held back between calls. The existence cache belongs to
/// this task alone.
pub struct SinkTask<A, D, C = JsonDocumentConverter> {
    config: SinkConfig,
    admin: A,
    dispatcher: D,
    converter: C,
    existing: ExistenceCache,
}

impl<A, D> SinkTask<A, D, JsonDocumentConverter>
where
    A: AdminTransport,
    D: DispatchTransport,
{
    pub fn new(config: SinkConfig, admin: A, dispatcher: D) -> Self {
        Self::start(config, admin, dispatcher, JsonDocumentConverter)
    }
}

impl<A, D, C> SinkTask<A, D, C>
where
    A: AdminTransport,
    D: DispatchTransport,
    C: DocumentConverter,
{
    /// Start the task with its policy and collaborators. The existence cache
    /// starts empty.
    pub fn start(config: SinkConfig, admin: A, dispatcher: D, converter: C) -> Self {
        tracing::info!(
            "[SINK {}] starting (auto_create={}, shards={}, replicas={})",
            config.task_id,
            config.collection.auto_create,
            config.collection.num_shards,
            config.collection.replication_factor
        );
        Self {
            config,
            admin,
            dispatcher,
            converter,
            existing: ExistenceCache::new(),
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn existence_cache(&self) -> &ExistenceCache {
        &self.existing
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Apply one batch of records.
    ///
    /// Either every destination is fully dispatched or the call fails with a
    /// single error. A `Retriable` failure may leave earlier destinations
    /// applied; redelivering the identical batch is safe because adds are
    /// keyed by id and deletes of absent ids are no-ops.
    pub async fn process_batch(&mut self, records: &[Record]) -> Result<(), DispatchError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut batches: IndexMap<String, DestinationBatch> = IndexMap::new();
        for record in records {
            let destination = self.config.destination_for(&record.topic);
            let op = Operation::from_record(record, &self.converter)
                .map_err(DispatchError::NonRetriable)?;
            tracing::trace!(
                "[SINK {}] {}-{}@{} -> {} ({})",
                self.config.task_id,
                record.topic,
                record.partition,
                record.offset,
                destination,
                if op.is_upsert() { "upsert" } else { "delete" }
            );
            batches
                .entry(destination.to_string())
                .or_default()
                .add(op);
        }

        for (destination, batch) in batches {
            if let Err(e) = self.dispatch(&destination, batch).await {
                tracing::warn!(
                    "[SINK {}] dispatch to {} failed, batch must be redelivered: {}",
                    self.config.task_id,
                    destination,
                    e
                );
                return Err(DispatchError::Retriable(e));
            }
        }

        Ok(())
    }

    async fn dispatch(
        &mut self,
        destination: &str,
        batch: DestinationBatch,
    ) -> crate::error::Result<()> {
        self.existing
            .assure(&self.admin, destination, &self.config.collection)
            .await?;

        tracing::debug!(
            "[SINK {}] dispatching {} operation(s) to {}",
            self.config.task_id,
            batch.len(),
            destination
        );
        for request in batch.operations() {
            tracing::trace!(
                "[SINK {}] {} {} x{}",
                self.config.task_id,
                destination,
                request.kind(),
                request.len()
            );
            self.dispatcher.send(destination, &request).await?;
        }
        self.dispatcher.flush(destination).await
    }

    /// Offset acknowledgment hook. Every accepted batch has already been
    /// applied by the time `process_batch` returns, so there is nothing to do.
    pub fn flush(&self) {
        tracing::trace!("[SINK {}] flush: nothing buffered", self.config.task_id);
    }

    pub fn stop(self) {
        tracing::info!(
            "[SINK {}] stopping ({} collection(s) confirmed)",
            self.config.task_id,
            self.existing.len()
        );
    }
}
