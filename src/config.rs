//! Runtime configuration for the `image-jobs` binary.
//!
//! Loaded from a TOML file passed with `--config`. Every key is optional;
//! without a file the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [store]
//! root = "store"        # Directory holding one subdirectory per bucket
//!
//! [encoding]
//! jpeg_quality = 90     # JPEG quality for image artifacts (1-100)
//!
//! [logging]
//! level = "info"        # trace, debug, info, warn, error, off
//! ```
//!
//! Output namespaces and the 1024×1024 thumbnail bound are fixed policy, not
//! configuration.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Quality;
use crate::processor::ProcessOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobsConfig {
    pub store: StoreConfig,
    pub encoding: EncodingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Filesystem root for [`FsStore`](crate::store::FsStore).
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub jpeg_quality: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::default().value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.level).map_err(|_| {
            ConfigError::Validation(format!(
                "logging.level must be one of trace, debug, info, warn, error, off (got {:?})",
                self.level
            ))
        })
    }
}

impl JobsConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.store.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation("store.root must not be empty".into()));
        }
        self.logging.level_filter()?;
        Ok(())
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            quality: Quality::new(self.encoding.jpeg_quality),
        }
    }
}

/// Parse and validate a config document.
pub fn parse_config(content: &str) -> Result<JobsConfig, ConfigError> {
    let config: JobsConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or stock defaults when no path is given.
///
/// An explicitly named file that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<JobsConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(JobsConfig::default()),
    }
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-jobs configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Object storage
# ---------------------------------------------------------------------------
[store]
# Directory used as the object store. Each bucket is a subdirectory and
# object keys are paths inside it: bucket "photos", key "images/cat.jpg"
# lives at <root>/photos/images/cat.jpg.
root = "store"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality for greyscale and resized artifacts (1 = worst, 100 = best).
jpeg_quality = 90

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Default log level: trace, debug, info, warn, error or off.
# RUST_LOG overrides this when set.
level = "info"
"##
}
