use super::operation::Operation;
use crate::transport::UpdateRequest;
use std::iter::Peekable;

/// Operations bound for one destination, in arrival order.
///
/// Lives for a single `process_batch` call.
#[derive(Debug, Default)]
pub struct DestinationBatch {
    ops: Vec<Operation>,
}

impl DestinationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, op: Operation) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume the batch as dispatch-ready requests.
    ///
    /// Runs of the same kind are coalesced; every upsert/delete transition
    /// starts a new request so the destination sees the original order.
    pub fn operations(self) -> UpdateRequests {
        UpdateRequests {
            ops: self.ops.into_iter().peekable(),
        }
    }
}

/// Lazy iterator returned by [`DestinationBatch::operations`].
pub struct UpdateRequests {
    ops: Peekable<std::vec::IntoIter<Operation>>,
}

impl Iterator for UpdateRequests {
    type Item = UpdateRequest;

    fn next(&mut self) -> Option<UpdateRequest> {
        match self.ops.next()? {
            Operation::Upsert { document } => {
                let mut docs = vec![document];
                while let Some(Operation::Upsert { .. }) = self.ops.peek() {
                    if let Some(Operation::Upsert { document }) = self.ops.next() {
                        docs.push(document);
                    }
                }
                Some(UpdateRequest::Add(docs))
            }
            Operation::Delete { key } => {
                let mut keys = vec![key];
                while let Some(Operation::Delete { .. }) = self.ops.peek() {
                    if let Some(Operation::Delete { key }) = self.ops.next() {
                        keys.push(key);
                    }
                }
                Some(UpdateRequest::Delete(keys))
            }
        }
    }
}
