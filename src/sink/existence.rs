use crate::config::CollectionPolicy;
use crate::error::Result;
use crate::transport::AdminTransport;
use std::collections::HashSet;

/// Collections known to exist, either seen in a listing or created by this
/// task. Grows for the lifetime of the task and is never invalidated:
/// collections are assumed not to be dropped out-of-band while it runs.
#[derive(Debug, Default)]
pub struct ExistenceCache {
    known: HashSet<String>,
}

impl ExistenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.known.contains(collection)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Make sure `collection` exists before anything is dispatched to it.
    ///
    /// Does nothing when auto-create is off or the collection was already
    /// confirmed. Errors from the admin transport propagate as-is and leave
    /// the cache untouched, so the next call checks again.
    pub async fn assure<A: AdminTransport>(
        &mut self,
        admin: &A,
        collection: &str,
        policy: &CollectionPolicy,
    ) -> Result<()> {
        if !policy.auto_create || self.known.contains(collection) {
            return Ok(());
        }

        let collections = admin.list_collections().await?;
        if !collections.iter().any(|c| c == collection) {
            let max_shards_per_node = policy.num_shards.max(policy.max_shards_per_node);
            tracing::info!(
                "Auto create collection {} (shards={}, replicas={}, max_shards_per_node={})",
                collection,
                policy.num_shards,
                policy.replication_factor,
                max_shards_per_node
            );
            admin
                .create_collection(
                    collection,
                    policy.num_shards,
                    policy.replication_factor,
                    max_shards_per_node,
                )
                .await?;
        } else {
            tracing::debug!("Collection {} already exists", collection);
        }

        self.known.insert(collection.to_string());
        Ok(())
    }
}
