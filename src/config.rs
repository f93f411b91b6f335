use crate::error::{Result, SinkError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// How missing collections are created. Read-only while batches are processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionPolicy {
    pub auto_create: bool,
    pub num_shards: u32,
    pub replication_factor: u32,
    pub max_shards_per_node: u32,
}

impl Default for CollectionPolicy {
    fn default() -> Self {
        Self {
            auto_create: false,
            num_shards: 1,
            replication_factor: 1,
            max_shards_per_node: 1,
        }
    }
}

impl CollectionPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.num_shards == 0 {
            return Err(SinkError::Config("num_shards must be at least 1".into()));
        }
        if self.replication_factor == 0 {
            return Err(SinkError::Config(
                "replication_factor must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_task_id")]
    pub task_id: String,
    #[serde(default)]
    pub collection: CollectionPolicy,
    /// Topic -> collection overrides. Unlisted topics map to themselves.
    #[serde(default)]
    pub topic_collections: HashMap<String, String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            task_id: default_task_id(),
            collection: CollectionPolicy::default(),
            topic_collections: HashMap::new(),
        }
    }
}

fn default_task_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

impl SinkConfig {
    /// Load from a JSON file (if given), then apply `SOLR_SINK_*` environment
    /// overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    SinkError::Config(format!("failed to read {}: {}", path.display(), e))
                })?;
                let config: SinkConfig = serde_json::from_str(&content).map_err(|e| {
                    SinkError::Config(format!("failed to parse {}: {}", path.display(), e))
                })?;
                tracing::info!(
                    "Loaded sink config from {}: task_id={}",
                    path.display(),
                    config.task_id
                );
                config
            }
            None => SinkConfig::default(),
        };

        config.apply_env()?;
        config.collection.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(task_id) = env_var("SOLR_SINK_TASK_ID") {
            self.task_id = task_id;
        }
        if let Some(v) = env_var("SOLR_SINK_AUTO_CREATE") {
            self.collection.auto_create = parse_bool("SOLR_SINK_AUTO_CREATE", &v)?;
        }
        if let Some(v) = env_var("SOLR_SINK_NUM_SHARDS") {
            self.collection.num_shards = parse_u32("SOLR_SINK_NUM_SHARDS", &v)?;
        }
        if let Some(v) = env_var("SOLR_SINK_REPLICATION_FACTOR") {
            self.collection.replication_factor = parse_u32("SOLR_SINK_REPLICATION_FACTOR", &v)?;
        }
        if let Some(v) = env_var("SOLR_SINK_MAX_SHARDS_PER_NODE") {
            self.collection.max_shards_per_node = parse_u32("SOLR_SINK_MAX_SHARDS_PER_NODE", &v)?;
        }
        Ok(())
    }

    /// Destination collection for records of `topic`.
    pub fn destination_for<'a>(&'a self, topic: &'a str) -> &'a str {
        self.topic_collections
            .get(topic)
            .map(String::as_str)
            .unwrap_or(topic)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(SinkError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

fn parse_u32(name: &str, raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        SinkError::Config(format!(
            "{} must be a non-negative integer, got '{}'",
            name, raw
        ))
    })
}
