use crate::errors::StandInError;
use crate::logging::{JsonlLogger, DEFAULT_MAX_PAYLOAD_BYTES};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Nodes deeper than this degrade to an inert placeholder.
pub const MAX_DEPTH: usize = 10;
pub const DEFAULT_ROOT_NAME: &str = "mock";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StandInConfig {
    pub generator: GeneratorConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub max_depth: usize,
    pub root_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    pub track_recorders: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub max_payload_bytes: usize,
}

impl Default for StandInConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig {
                max_depth: MAX_DEPTH,
                root_name: DEFAULT_ROOT_NAME.to_string(),
            },
            registry: RegistryConfig {
                track_recorders: true,
            },
            logging: LoggingConfig {
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            },
        }
    }
}

impl StandInConfig {
    /// A JSONL logger writing to `sink` with this config's payload limit.
    pub fn logger(&self, sink: impl Write + Send + 'static) -> JsonlLogger {
        let mut logger = JsonlLogger::new(sink);
        logger.max_payload_bytes = self.logging.max_payload_bytes;
        logger
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialStandInConfig {
    generator: Option<PartialGeneratorConfig>,
    registry: Option<PartialRegistryConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialGeneratorConfig {
    max_depth: Option<usize>,
    root_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialRegistryConfig {
    track_recorders: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLoggingConfig {
    max_payload_bytes: Option<usize>,
}

/// Parses a TOML document and merges it over the defaults. Omitted keys keep
/// their default values.
pub fn load_config_str(contents: &str) -> Result<StandInConfig, StandInError> {
    let partial: PartialStandInConfig =
        toml::from_str(contents).map_err(|e| StandInError::ConfigParse(e.to_string()))?;
    let mut cfg = StandInConfig::default();
    merge_partial_config(&mut cfg, partial);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut StandInConfig, partial: PartialStandInConfig) {
    if let Some(generator) = partial.generator {
        if let Some(max_depth) = generator.max_depth {
            cfg.generator.max_depth = max_depth;
        }
        if let Some(root_name) = generator.root_name {
            cfg.generator.root_name = root_name;
        }
    }

    if let Some(registry) = partial.registry {
        if let Some(track_recorders) = registry.track_recorders {
            cfg.registry.track_recorders = track_recorders;
        }
    }

    if let Some(logging) = partial.logging {
        if let Some(max_payload_bytes) = logging.max_payload_bytes {
            cfg.logging.max_payload_bytes = max_payload_bytes;
        }
    }
}

pub fn validate_config(cfg: &StandInConfig) -> Result<(), StandInError> {
    if cfg.generator.root_name.trim().is_empty() {
        return Err(StandInError::InvalidConfig(
            "generator.root_name must not be empty".to_string(),
        ));
    }

    if cfg.logging.max_payload_bytes == 0 {
        return Err(StandInError::InvalidConfig(
            "logging.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
