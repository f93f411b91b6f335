//! In-process cluster for dry runs and tests.
//!
//! Behaves like a small search cluster: collections hold documents keyed by
//! their unique key, adds are last-write-wins and deletes of absent ids are
//! no-ops. Every admin and dispatch call is recorded, and failures can be
//! injected for the next N calls of a given kind.

use crate::error::{Result, SinkError};
use crate::transport::{AdminTransport, DispatchTransport, UpdateRequest};
use crate::types::Document;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// A recorded create-collection call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCall {
    pub name: String,
    pub num_shards: u32,
    pub replication_factor: u32,
    pub max_shards_per_node: u32,
}

#[derive(Debug, Default)]
struct ClusterState {
    collections: HashMap<String, BTreeMap<String, Document>>,
    list_calls: usize,
    created: Vec<CreateCall>,
    dispatched: Vec<(String, UpdateRequest)>,
    flushes: Vec<String>,
    fail_lists: usize,
    fail_creates: usize,
    fail_sends: usize,
}

/// Cloneable handle; clones share the same cluster state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collections(names: &[&str]) -> Self {
        let cluster = Self::new();
        {
            let mut state = cluster.lock();
            for name in names {
                state.collections.insert(name.to_string(), BTreeMap::new());
            }
        }
        cluster
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_next_lists(&self, n: usize) {
        self.lock().fail_lists = n;
    }

    pub fn fail_next_creates(&self, n: usize) {
        self.lock().fail_creates = n;
    }

    pub fn fail_next_sends(&self, n: usize) {
        self.lock().fail_sends = n;
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Number of create calls, failed attempts included.
    pub fn create_calls(&self) -> usize {
        self.lock().created.len()
    }

    pub fn created(&self) -> Vec<CreateCall> {
        self.lock().created.clone()
    }

    /// Every request handed to `send`, failed attempts included, in order.
    pub fn dispatched(&self) -> Vec<(String, UpdateRequest)> {
        self.lock().dispatched.clone()
    }

    pub fn dispatched_to(&self, collection: &str) -> Vec<UpdateRequest> {
        self.lock()
            .dispatched
            .iter()
            .filter(|(c, _)| c == collection)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn flushes(&self) -> Vec<String> {
        self.lock().flushes.clone()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.lock().collections.contains_key(name)
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.lock().collections.get(collection)?.get(id).cloned()
    }

    pub fn doc_count(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Full contents of every collection, for comparing end states.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<String, Document>> {
        self.lock()
            .collections
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn take_failure(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

impl AdminTransport for InMemoryCluster {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let mut state = self.lock();
        state.list_calls += 1;
        if take_failure(&mut state.fail_lists) {
            return Err(SinkError::Transport("simulated listing failure".into()));
        }
        let mut names: Vec<String> = state.collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_collection(
        &self,
        name: &str,
        num_shards: u32,
        replication_factor: u32,
        max_shards_per_node: u32,
    ) -> Result<()> {
        let mut state = self.lock();
        state.created.push(CreateCall {
            name: name.to_string(),
            num_shards,
            replication_factor,
            max_shards_per_node,
        });
        if take_failure(&mut state.fail_creates) {
            return Err(SinkError::Transport("simulated creation failure".into()));
        }
        state.collections.entry(name.to_string()).or_default();
        Ok(())
    }
}

impl DispatchTransport for InMemoryCluster {
    async fn send(&mut self, collection: &str, request: &UpdateRequest) -> Result<()> {
        let mut state = self.lock();
        state
            .dispatched
            .push((collection.to_string(), request.clone()));
        if take_failure(&mut state.fail_sends) {
            return Err(SinkError::Transport("simulated dispatch failure".into()));
        }

        let docs = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| SinkError::Server {
                status: 404,
                message: format!("collection {} does not exist", collection),
            })?;

        match request {
            UpdateRequest::Add(batch) => {
                // Validate first so a rejected request leaves no partial writes.
                if batch.iter().any(|d| d.id().is_none()) {
                    return Err(SinkError::Server {
                        status: 400,
                        message: "document is missing mandatory uniqueKey field: id".into(),
                    });
                }
                for doc in batch {
                    if let Some(id) = doc.id() {
                        docs.insert(id, doc.clone());
                    }
                }
            }
            UpdateRequest::Delete(ids) => {
                for id in ids {
                    docs.remove(id);
                }
            }
        }
        Ok(())
    }

    async fn flush(&mut self, collection: &str) -> Result<()> {
        self.lock().flushes.push(collection.to_string());
        Ok(())
    }
}
