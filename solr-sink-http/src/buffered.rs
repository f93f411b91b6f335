use super::client::SolrClient;
use solr_sink::{DispatchTransport, SinkError, UpdateRequest};
use std::collections::HashMap;

/// Buffered dispatch: requests for a collection are queued and sent as a
/// single ordered command stream once `queue_size` operations are waiting,
/// or when the collection is flushed at the end of a batch.
///
/// Nothing survives a batch: the sink flushes every collection it sent to
/// before `process_batch` returns.
pub struct BufferedDispatcher {
    client: SolrClient,
    queue_size: usize,
    pending: HashMap<String, Vec<UpdateRequest>>,
}

impl BufferedDispatcher {
    pub fn new(client: SolrClient) -> Self {
        let queue_size = client.config().queue_size.max(1);
        Self {
            client,
            queue_size,
            pending: HashMap::new(),
        }
    }

    /// Operations currently queued for `collection`.
    pub fn pending_ops(&self, collection: &str) -> usize {
        self.pending
            .get(collection)
            .map(|reqs| reqs.iter().map(UpdateRequest::len).sum())
            .unwrap_or(0)
    }

    async fn drain(&mut self, collection: &str) -> Result<(), SinkError> {
        let Some(requests) = self.pending.remove(collection) else {
            return Ok(());
        };
        self.client.send_commands(collection, &requests).await
    }
}

impl DispatchTransport for BufferedDispatcher {
    async fn send(&mut self, collection: &str, request: &UpdateRequest) -> Result<(), SinkError> {
        if request.is_empty() {
            return Ok(());
        }
        self.pending
            .entry(collection.to_string())
            .or_default()
            .push(request.clone());

        if self.pending_ops(collection) >= self.queue_size {
            self.drain(collection).await?;
        }
        Ok(())
    }

    async fn flush(&mut self, collection: &str) -> Result<(), SinkError> {
        self.drain(collection).await
    }
}
