// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker client configuration.
//!
//! Consumer and producer settings start from immutable defaults and are
//! merged with per-instance overrides into a fresh [`ClientConfig`]. The
//! defaults themselves are never modified.

use crate::config::ProcessorConfig;
use std::collections::BTreeMap;
use std::fmt;

/// Key holding the broker address for both clients
pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
/// Key holding the consumer group
pub const GROUP_ID: &str = "group.id";
/// Prefix of generated consumer groups
pub const GROUP_ID_PREFIX: &str = "evp_";

/// Consumer defaults, applied before any override
pub const CONSUMER_DEFAULTS: &[(&str, &str)] = &[
    (BOOTSTRAP_SERVERS, "kafka:9092"),
    ("enable.auto.commit", "true"),
    ("auto.commit.interval.ms", "10000"),
    ("session.timeout.ms", "30000"),
    ("fetch.max.bytes", "5000012"),
    ("auto.offset.reset", "latest"),
];

/// Producer defaults, applied before any override
pub const PRODUCER_DEFAULTS: &[(&str, &str)] = &[
    (BOOTSTRAP_SERVERS, "kafka:9092"),
    ("acks", "all"),
    ("retries", "0"),
    ("linger.ms", "20"),
];

/// Merged key/value settings for one broker client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    entries: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Build a config from a defaults table
    pub fn from_defaults(defaults: &[(&str, &str)]) -> Self {
        Self {
            entries: defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Consumer settings for a processor instance.
    ///
    /// Precedence, lowest first: defaults, the generated `group_id`, the
    /// `bootstrap_servers` override, then explicit per-key overrides.
    pub fn consumer(config: &ProcessorConfig, group_id: &str) -> Self {
        Self::from_defaults(CONSUMER_DEFAULTS)
            .with(GROUP_ID, group_id)
            .with_bootstrap(config.bootstrap_servers.as_deref())
            .with_overrides(&config.consumer)
    }

    /// Producer settings for a processor instance
    pub fn producer(config: &ProcessorConfig) -> Self {
        Self::from_defaults(PRODUCER_DEFAULTS)
            .with_bootstrap(config.bootstrap_servers.as_deref())
            .with_overrides(&config.producer)
    }

    /// Return a copy with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    fn with_bootstrap(self, servers: Option<&str>) -> Self {
        match servers {
            Some(servers) => self.with(BOOTSTRAP_SERVERS, servers),
            None => self,
        }
    }

    fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (key, value) in overrides {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn bootstrap_servers(&self) -> Option<&str> {
        self.get(BOOTSTRAP_SERVERS)
    }

    pub fn group_id(&self) -> Option<&str> {
        self.get(GROUP_ID)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
