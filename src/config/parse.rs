use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use super::types::Config;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    let config: Config = serde_yaml::from_str(&yaml)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.store.url.is_empty() {
        errors.push("store.url cannot be empty".to_string());
    } else if !config.store.url.starts_with("http://") && !config.store.url.starts_with("https://")
    {
        errors.push(format!(
            "store.url must start with http:// or https://: '{}'",
            config.store.url
        ));
    }
    if config.store.timeout.is_zero() {
        errors.push("store.timeout must be greater than zero".to_string());
    }

    if config.batch.size == 0 {
        errors.push("batch.size must be at least 1".to_string());
    }
    if config.batch.idle_timeout.is_zero() {
        errors.push("batch.idle_timeout must be greater than zero".to_string());
    }

    for (name, collection) in &config.collections {
        if name.is_empty() {
            errors.push("collection names cannot be empty".to_string());
        }
        if collection.vector_size == 0 {
            errors.push(format!(
                "collection '{}': vector_size must be at least 1",
                name
            ));
        }
        if let Some(ttl) = collection.ttl {
            if ttl.is_zero() {
                errors.push(format!(
                    "collection '{}': ttl must be greater than zero (omit it to disable expiry)",
                    name
                ));
            } else if chrono::Duration::from_std(ttl).is_err() {
                errors.push(format!("collection '{}': ttl is out of range", name));
            }
        }
    }

    if config.sweep.interval < Duration::from_secs(1) {
        errors.push("sweep.interval must be at least 1s".to_string());
    }
    for name in &config.sweep.collections {
        if !config.collections.contains_key(name) {
            errors.push(format!(
                "sweep.collections references unknown collection '{}'",
                name
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{BatchConfig, CollectionConfig, StoreConfig, SweepConfig};
    use std::collections::HashMap;

    fn valid_config() -> Config {
        Config {
            store: StoreConfig {
                url: "http://localhost:6333".to_string(),
                timeout: Duration::from_secs(30),
            },
            batch: BatchConfig::default(),
            collections: HashMap::new(),
            sweep: SweepConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn bad_url_and_zero_batch_are_both_reported() {
        let mut config = valid_config();
        config.store.url = "localhost:6333".to_string();
        config.batch.size = 0;

        let err = validate_config(&config).unwrap_err();
        match err {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors[0].contains("store.url"));
                assert!(errors[1].contains("batch.size"));
            }
            other => panic!("expected validation list, got: {}", other),
        }
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let mut config = valid_config();
        config.collections.insert(
            "logs".to_string(),
            CollectionConfig {
                vector_size: 384,
                ttl: Some(Duration::ZERO),
            },
        );

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn sweep_reference_to_unknown_collection_is_rejected() {
        let mut config = valid_config();
        config.sweep.collections = vec!["missing".to_string()];

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("unknown collection 'missing'"));
    }
}
