// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalogue of processors an embedding host can instantiate.

use crate::error::ProcessorError;
use crate::processor::EventProcessor;
use evp_core::{ProcessorConfig, ProcessorKind};
use std::collections::BTreeMap;
use std::fmt;

/// Human-facing metadata for a registered processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorDescription {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kinds: Vec<ProcessorKind>,
}

impl ProcessorDescription {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kinds: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_kind(mut self, kind: ProcessorKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }
}

impl fmt::Display for ProcessorDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.name)?;
        if !self.kinds.is_empty() {
            let kinds: Vec<_> = self.kinds.iter().map(|k| k.label()).collect();
            write!(f, " [{}]", kinds.join(", "))?;
        }
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        Ok(())
    }
}

/// Builds a processor for one invocation
pub type ProcessorFactory = Box<
    dyn Fn(&ProcessorConfig) -> Result<Box<dyn EventProcessor>, ProcessorError> + Send + Sync,
>;

struct Entry {
    description: ProcessorDescription,
    factory: ProcessorFactory,
}

/// Processors by id, iterated in id order
#[derive(Default)]
pub struct ProcessorRegistry {
    entries: BTreeMap<String, Entry>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a processor. Ids must be unique.
    pub fn register<F>(
        &mut self,
        description: ProcessorDescription,
        factory: F,
    ) -> Result<(), ProcessorError>
    where
        F: Fn(&ProcessorConfig) -> Result<Box<dyn EventProcessor>, ProcessorError>
            + Send
            + Sync
            + 'static,
    {
        if self.entries.contains_key(&description.id) {
            return Err(ProcessorError::DuplicateProcessor(description.id));
        }
        self.entries.insert(
            description.id.clone(),
            Entry {
                description,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ProcessorDescription> {
        self.entries.get(id).map(|e| &e.description)
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &ProcessorDescription> {
        self.entries.values().map(|e| &e.description)
    }

    /// Build the processor registered under `id`
    pub fn create(
        &self,
        id: &str,
        config: &ProcessorConfig,
    ) -> Result<Box<dyn EventProcessor>, ProcessorError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| ProcessorError::ProcessorNotFound(id.to_string()))?;
        (entry.factory)(config)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
