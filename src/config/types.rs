use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub collections: HashMap<String, CollectionConfig>,
    #[serde(default)]
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    #[serde(with = "humantime_serde", default = "default_store_timeout")]
    pub timeout: Duration,
}

fn default_store_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Flush triggers for the ingestion batch buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub size: usize,
    #[serde(with = "humantime_serde", default = "default_idle_timeout")]
    pub idle_timeout: Duration,
}

fn default_batch_size() -> usize {
    15
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(3)
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

/// Per-collection policy: vector dimensionality and an optional TTL.
/// Omitting `ttl` means records in the collection never expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_vector_size")]
    pub vector_size: usize,
    #[serde(with = "humantime_serde", default)]
    pub ttl: Option<Duration>,
}

fn default_vector_size() -> usize {
    384
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            vector_size: default_vector_size(),
            ttl: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub interval: Duration,
    /// Collections to sweep. Empty means every configured collection that
    /// has a TTL.
    #[serde(default)]
    pub collections: Vec<String>,
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(6 * 3600)
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: default_sweep_interval(),
            collections: Vec::new(),
        }
    }
}

impl Config {
    /// Policy for a collection, falling back to defaults for collections
    /// that are not declared in the config.
    pub fn collection(&self, name: &str) -> CollectionConfig {
        self.collections.get(name).cloned().unwrap_or_default()
    }

    /// Collections the sweeper should visit: the configured list, or every
    /// declared collection with a TTL when the list is empty.
    pub fn sweep_targets(&self) -> Vec<String> {
        if !self.sweep.collections.is_empty() {
            return self.sweep.collections.clone();
        }
        let mut targets: Vec<String> = self
            .collections
            .iter()
            .filter(|(_, c)| c.ttl.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        targets.sort();
        targets
    }
}
