//! Configuration loading with Figment.
//!
//! Configuration is layered from:
//! 1. a TOML file (`urqmd-ingest.toml` by default, optional), then
//! 2. environment variables prefixed with `URQMD_INGEST_`, using `__` between
//!    section and key: `URQMD_INGEST_READER__CHUNK_LINES=250000`.
//!
//! CLI flags are applied on top by the binary. Every field has a default, so
//! an empty configuration is valid; `validate` catches values that parse but
//! cannot work.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "urqmd-ingest.toml";

/// Top-level configuration for one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Reader settings
    #[serde(default)]
    pub reader: ReaderConfig,
    /// Store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Reader-side tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Lines per read batch. A memory/throughput knob only; event boundaries
    /// do not align with it.
    #[serde(default = "default_chunk_lines")]
    pub chunk_lines: usize,
    /// Bounded queue capacity between reader and store, in chunks.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Store-side options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Whether to write the `event_id` / `event_impact_parameter` columns.
    #[serde(default = "default_include_event_columns")]
    pub include_event_columns: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_owned()
}

fn default_chunk_lines() -> usize {
    100_000
}

fn default_queue_capacity() -> usize {
    4
}

fn default_include_event_columns() -> bool {
    true
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_lines: default_chunk_lines(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            include_event_columns: default_include_event_columns(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            reader: ReaderConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Loads configuration from the default file location and environment.
    ///
    /// The file is optional; environment variables can configure everything.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration from a specific file path plus environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("URQMD_INGEST_").split("__"))
            .extract()
    }

    /// Validates configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.reader.chunk_lines == 0 {
            return Err("chunk_lines must be at least 1".to_owned());
        }

        if self.reader.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".to_owned());
        }

        Ok(())
    }
}
