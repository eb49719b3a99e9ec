// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processors shipped with the daemon

use async_trait::async_trait;
use evp_core::{Event, ProcessorConfig, ProcessorKind};
use evp_engine::{EventProcessor, ProcessorDescription, ProcessorError, ProcessorRegistry};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info};

pub const PASSTHROUGH: &str = "passthrough";
pub const FIELD_SCALE: &str = "field-scale";
pub const NUMERICAL_FILTER: &str = "numerical-filter";

/// Register every built-in processor
pub fn register_builtin(registry: &mut ProcessorRegistry) -> Result<(), ProcessorError> {
    registry.register(
        ProcessorDescription::new(PASSTHROUGH, "Passthrough")
            .with_description("Forwards every event unchanged")
            .with_kind(ProcessorKind::Transform),
        |_| Ok(Box::new(Passthrough::default())),
    )?;
    registry.register(
        ProcessorDescription::new(FIELD_SCALE, "Field Scale")
            .with_description("Multiplies a numeric field by a constant factor")
            .with_kind(ProcessorKind::Transform)
            .with_kind(ProcessorKind::Algorithm),
        |config| Ok(Box::new(FieldScale::from_config(config)?)),
    )?;
    registry.register(
        ProcessorDescription::new(NUMERICAL_FILTER, "Numerical Filter")
            .with_description("Forwards events whose numeric field passes a comparison")
            .with_kind(ProcessorKind::Filter),
        |config| Ok(Box::new(NumericalFilter::from_config(config)?)),
    )?;
    Ok(())
}

fn invalid(processor: &str, property: &str, reason: impl Into<String>) -> ProcessorError {
    ProcessorError::InvalidProperty {
        processor: processor.to_string(),
        property: property.to_string(),
        reason: reason.into(),
    }
}

fn required_str(
    config: &ProcessorConfig,
    processor: &str,
    key: &str,
) -> Result<String, ProcessorError> {
    match config.property(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(other) => Err(invalid(
            processor,
            key,
            format!("expected a non-empty string, got {other}"),
        )),
        None => Err(invalid(processor, key, "missing")),
    }
}

fn number(
    config: &ProcessorConfig,
    processor: &str,
    key: &str,
) -> Result<Option<f64>, ProcessorError> {
    let Some(value) = config.property(key) else {
        return Ok(None);
    };
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| invalid(processor, key, format!("expected a number, got {value}")))
}

/// Forwards every event unchanged
#[derive(Debug, Default)]
pub struct Passthrough {
    forwarded: u64,
}

#[async_trait]
impl EventProcessor for Passthrough {
    async fn on_invocation(&mut self, config: &ProcessorConfig) {
        info!(invocation_id = %config.invocation_id, "passthrough ready");
    }

    async fn on_event(&mut self, event: Event) -> Option<Value> {
        self.forwarded += 1;
        Some(event.into_value())
    }

    async fn on_detach(&mut self) {
        info!(forwarded = self.forwarded, "passthrough detached");
    }
}

/// Multiplies `field` by `factor` (default 2) in object events.
///
/// Integers stay integers when the factor is integral. Events without a
/// numeric `field`, and arrays, are forwarded unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScale {
    field: String,
    factor: f64,
}

impl FieldScale {
    pub const DEFAULT_FACTOR: f64 = 2.0;

    pub fn new(field: impl Into<String>, factor: f64) -> Self {
        Self {
            field: field.into(),
            factor,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let field = required_str(config, FIELD_SCALE, "field")?;
        let factor = number(config, FIELD_SCALE, "factor")?.unwrap_or(Self::DEFAULT_FACTOR);
        Ok(Self::new(field, factor))
    }

    fn scale(&self, value: &Value) -> Option<Value> {
        if self.factor.fract() == 0.0 && self.factor.abs() < i64::MAX as f64 {
            let product = value
                .as_i64()
                .and_then(|n| n.checked_mul(self.factor as i64));
            if let Some(product) = product {
                return Some(Value::from(product));
            }
        }
        value.as_f64().map(|n| Value::from(n * self.factor))
    }

    fn apply(&self, mut object: Map<String, Value>) -> Map<String, Value> {
        let scaled = object.get(&self.field).and_then(|v| self.scale(v));
        match scaled {
            Some(scaled) => {
                object.insert(self.field.clone(), scaled);
            }
            None => debug!(field = %self.field, "field missing or not numeric; forwarded as is"),
        }
        object
    }
}

#[async_trait]
impl EventProcessor for FieldScale {
    async fn on_invocation(&mut self, config: &ProcessorConfig) {
        info!(
            invocation_id = %config.invocation_id,
            field = %self.field,
            factor = self.factor,
            "field-scale ready"
        );
    }

    async fn on_event(&mut self, event: Event) -> Option<Value> {
        match event.into_value() {
            Value::Object(object) => Some(Value::Object(self.apply(object))),
            other => Some(other),
        }
    }

    async fn on_detach(&mut self) {}
}

/// Comparison applied by [`NumericalFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "<" | "lt" => Some(Comparison::Lt),
            "<=" | "le" => Some(Comparison::Le),
            ">" | "gt" => Some(Comparison::Gt),
            ">=" | "ge" => Some(Comparison::Ge),
            "==" | "eq" => Some(Comparison::Eq),
            "!=" | "ne" => Some(Comparison::Ne),
            _ => None,
        }
    }

    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Eq => value == threshold,
            Comparison::Ne => value != threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        };
        f.write_str(symbol)
    }
}

/// Forwards object events whose numeric `field` satisfies
/// `field <operator> threshold`; everything else is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericalFilter {
    field: String,
    comparison: Comparison,
    threshold: f64,
    dropped: u64,
}

impl NumericalFilter {
    pub fn new(field: impl Into<String>, comparison: Comparison, threshold: f64) -> Self {
        Self {
            field: field.into(),
            comparison,
            threshold,
            dropped: 0,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, ProcessorError> {
        let field = required_str(config, NUMERICAL_FILTER, "field")?;
        let operator = required_str(config, NUMERICAL_FILTER, "operator")?;
        let comparison = Comparison::parse(operator.trim()).ok_or_else(|| {
            invalid(
                NUMERICAL_FILTER,
                "operator",
                format!("unknown operator {operator}"),
            )
        })?;
        let threshold = number(config, NUMERICAL_FILTER, "threshold")?
            .ok_or_else(|| invalid(NUMERICAL_FILTER, "threshold", "missing"))?;
        Ok(Self::new(field, comparison, threshold))
    }

    fn passes(&self, event: &Event) -> bool {
        event
            .get(&self.field)
            .and_then(Value::as_f64)
            .is_some_and(|v| self.comparison.holds(v, self.threshold))
    }
}

#[async_trait]
impl EventProcessor for NumericalFilter {
    async fn on_invocation(&mut self, config: &ProcessorConfig) {
        info!(
            invocation_id = %config.invocation_id,
            condition = %format_args!("{} {} {}", self.field, self.comparison, self.threshold),
            "numerical-filter ready"
        );
    }

    async fn on_event(&mut self, event: Event) -> Option<Value> {
        if self.passes(&event) {
            Some(event.into_value())
        } else {
            self.dropped += 1;
            None
        }
    }

    async fn on_detach(&mut self) {
        info!(dropped = self.dropped, "numerical-filter detached");
    }
}

#[cfg(test)]
#[path = "processors_tests.rs"]
mod tests;
