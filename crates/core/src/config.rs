// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor invocation configuration.
//!
//! A [`ProcessorConfig`] identifies one invocation of a processor: where it
//! reads, where it writes, and the static properties it was deployed with.

use crate::settings::{DispatchMode, RuntimeSettings};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating a processor configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML syntax error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Identity and parameters of one processor invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessorConfig {
    pub input_topic: String,
    pub output_topic: String,
    pub invocation_id: String,
    /// Broker address for both clients, replacing the default
    #[serde(default)]
    pub bootstrap_servers: Option<String>,
    /// Processor-specific parameters supplied at deployment
    #[serde(default)]
    pub static_properties: Map<String, Value>,
    /// Per-key consumer client overrides
    #[serde(default)]
    pub consumer: BTreeMap<String, String>,
    /// Per-key producer client overrides
    #[serde(default)]
    pub producer: BTreeMap<String, String>,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

impl ProcessorConfig {
    pub fn new(
        input_topic: impl Into<String>,
        output_topic: impl Into<String>,
        invocation_id: impl Into<String>,
    ) -> Self {
        Self {
            input_topic: input_topic.into(),
            output_topic: output_topic.into(),
            invocation_id: invocation_id.into(),
            bootstrap_servers: None,
            static_properties: Map::new(),
            consumer: BTreeMap::new(),
            producer: BTreeMap::new(),
            runtime: RuntimeSettings::default(),
        }
    }

    pub fn with_bootstrap_servers(mut self, servers: impl Into<String>) -> Self {
        self.bootstrap_servers = Some(servers.into());
        self
    }

    pub fn with_static_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.static_properties.insert(key.into(), value);
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeSettings) -> Self {
        self.runtime = runtime;
        self
    }

    /// Look up a static property by name
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.static_properties.get(key)
    }

    /// Parse and validate a configuration from TOML
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ProcessorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Check the constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_topic.trim().is_empty() {
            return Err(ConfigError::Invalid("input_topic must not be empty".into()));
        }
        if self.output_topic.trim().is_empty() {
            return Err(ConfigError::Invalid("output_topic must not be empty".into()));
        }
        if self.invocation_id.trim().is_empty() {
            return Err(ConfigError::Invalid("invocation_id must not be empty".into()));
        }
        if let Some(servers) = &self.bootstrap_servers {
            if servers.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "bootstrap_servers must not be empty when set".into(),
                ));
            }
        }
        if self.runtime.poll_timeout.is_zero() {
            return Err(ConfigError::Invalid("runtime.poll_timeout must be positive".into()));
        }
        if let DispatchMode::Staged { capacity: 0 } = self.runtime.dispatch {
            return Err(ConfigError::Invalid(
                "runtime.dispatch.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
