use solr_sink::{
    CollectionPolicy, DispatchTransport, InMemoryCluster, Record, SinkConfig, SinkError, SinkTask,
    UpdateRequest,
};

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn record(topic: &str, key: Option<&str>, value: Option<serde_json::Value>) -> Record {
    Record::new(topic, key, value)
}

pub fn config(auto_create: bool) -> SinkConfig {
    SinkConfig {
        task_id: "it".into(),
        collection: CollectionPolicy {
            auto_create,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn task(cluster: &InMemoryCluster) -> SinkTask<InMemoryCluster, InMemoryCluster> {
    SinkTask::new(config(true), cluster.clone(), cluster.clone())
}

/// Dispatcher that fails the next `remaining` sends to one collection and
/// forwards everything else to the in-memory cluster.
#[allow(dead_code)]
pub struct FlakyCollection {
    pub inner: InMemoryCluster,
    pub collection: String,
    pub remaining: usize,
}

impl DispatchTransport for FlakyCollection {
    async fn send(&mut self, collection: &str, request: &UpdateRequest) -> Result<(), SinkError> {
        if collection == self.collection && self.remaining > 0 {
            self.remaining -= 1;
            return Err(SinkError::Server {
                status: 503,
                message: format!("{} is recovering", collection),
            });
        }
        self.inner.send(collection, request).await
    }

    async fn flush(&mut self, collection: &str) -> Result<(), SinkError> {
        self.inner.flush(collection).await
    }
}
