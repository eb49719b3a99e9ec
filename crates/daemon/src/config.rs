// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file

use evp_core::{ConfigError, ProcessorConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Port used when `[broker]` names a host without one
pub const DEFAULT_BROKER_PORT: u16 = 9092;

/// Which broker adapter the daemon connects through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// One payload per line on stdin, one result per line on stdout
    #[default]
    Stdio,
    Kafka,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerSettings {
    pub kind: BrokerKind,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl BrokerSettings {
    /// `host:port` when a host is configured
    pub fn bootstrap_servers(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        Some(format!("{}:{}", host, self.port.unwrap_or(DEFAULT_BROKER_PORT)))
    }
}

/// Contents of the file passed to `evpd --config`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Registry id of the processor to host
    pub processor: String,
    #[serde(default)]
    pub broker: BrokerSettings,
    /// Log file; stderr when unset
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    pub invocation: ProcessorConfig,
}

impl DaemonConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DaemonConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processor.trim().is_empty() {
            return Err(ConfigError::Invalid("processor must not be empty".to_string()));
        }
        if self.broker.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            return Err(ConfigError::Invalid("broker.host must not be empty".to_string()));
        }
        if self.broker.port.is_some() && self.broker.host.is_none() {
            return Err(ConfigError::Invalid("broker.port requires broker.host".to_string()));
        }
        self.invocation.validate()
    }

    /// The processor configuration with `[broker]` host and port applied.
    ///
    /// A configured broker host replaces `invocation.bootstrap_servers`.
    pub fn processor_config(&self) -> ProcessorConfig {
        let config = self.invocation.clone();
        match self.broker.bootstrap_servers() {
            Some(servers) => config.with_bootstrap_servers(servers),
            None => config,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
