pub mod generate;
pub mod parse;
pub mod types;

pub use generate::generate_starter_config;
pub use parse::{load_config, ConfigError};
pub use types::{BatchConfig, CollectionConfig, Config, StoreConfig, SweepConfig};
