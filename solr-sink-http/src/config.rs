use serde::{Deserialize, Serialize};
use solr_sink::SinkError;

/// How update requests reach the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One HTTP request per update request.
    #[default]
    Direct,
    /// Queue requests per collection and send them as one command stream.
    Buffered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolrConfig {
    /// Base URL including the context path, e.g. `http://solr:8983/solr`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    /// Ask Solr to commit within this many milliseconds of each update.
    pub commit_within_ms: Option<u64>,
    pub mode: DispatchMode,
    /// Operations queued per collection before a buffered send.
    pub queue_size: usize,
}

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8983/solr".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
            commit_within_ms: None,
            mode: DispatchMode::Direct,
            queue_size: 100,
        }
    }
}

impl SolrConfig {
    pub fn validate(&self) -> Result<(), SinkError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(SinkError::Config(format!(
                "solr url must start with http:// or https://, got '{}'",
                self.url
            )));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(SinkError::Config(
                "solr password given without a username".into(),
            ));
        }
        if self.queue_size == 0 {
            return Err(SinkError::Config("queue_size must be at least 1".into()));
        }
        Ok(())
    }

    pub(crate) fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}
