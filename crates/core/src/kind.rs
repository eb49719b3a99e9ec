// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processor categories, used to describe registered processors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category a processor advertises when it is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessorKind {
    Filter,
    Aggregate,
    EnrichText,
    Enrich,
    Geo,
    PatternDetect,
    Algorithm,
    Transform,
    Uncategorized,
}

impl ProcessorKind {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ProcessorKind::Filter => "Filter",
            ProcessorKind::Aggregate => "Aggregation",
            ProcessorKind::EnrichText => "Text Functions",
            ProcessorKind::Enrich => "Enrichment",
            ProcessorKind::Geo => "Geospatial Operations",
            ProcessorKind::PatternDetect => "Pattern Detection",
            ProcessorKind::Algorithm => "Algorithm",
            ProcessorKind::Transform => "Transformation",
            ProcessorKind::Uncategorized => "Uncategorized",
        }
    }
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
