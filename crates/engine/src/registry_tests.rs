// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testing::{Behavior, Recorder};
use evp_core::Event;
use serde_json::json;

fn recorder_factory(
    _config: &ProcessorConfig,
) -> Result<Box<dyn EventProcessor>, ProcessorError> {
    Ok(Box::new(Recorder::new(Behavior::DoubleTemp)))
}

fn doubler() -> ProcessorDescription {
    ProcessorDescription::new("doubler", "Doubler")
        .with_description("Doubles the temp field")
        .with_kind(ProcessorKind::Transform)
}

#[test]
fn description_display_includes_kinds_and_text() {
    assert_eq!(
        doubler().to_string(),
        "doubler (Doubler) [Transformation]: Doubles the temp field"
    );
    assert_eq!(
        ProcessorDescription::new("bare", "Bare").to_string(),
        "bare (Bare)"
    );
}

#[test]
fn with_kind_ignores_duplicates() {
    let description = doubler()
        .with_kind(ProcessorKind::Transform)
        .with_kind(ProcessorKind::Filter);
    assert_eq!(
        description.kinds,
        vec![ProcessorKind::Transform, ProcessorKind::Filter]
    );
}

#[test]
fn register_rejects_duplicate_ids() {
    let mut registry = ProcessorRegistry::new();
    registry.register(doubler(), recorder_factory).unwrap();

    let err = registry.register(doubler(), recorder_factory).unwrap_err();

    assert!(matches!(err, ProcessorError::DuplicateProcessor(id) if id == "doubler"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn descriptions_are_ordered_by_id() {
    let mut registry = ProcessorRegistry::new();
    assert!(registry.is_empty());
    registry
        .register(ProcessorDescription::new("zeta", "Zeta"), recorder_factory)
        .unwrap();
    registry
        .register(ProcessorDescription::new("alpha", "Alpha"), recorder_factory)
        .unwrap();

    let ids: Vec<_> = registry.descriptions().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "zeta"]);
    assert_eq!(registry.get("zeta").map(|d| d.name.as_str()), Some("Zeta"));
    assert!(registry.get("missing").is_none());
}

#[test]
fn create_unknown_id_fails() {
    let registry = ProcessorRegistry::new();
    let config = ProcessorConfig::new("in", "out", "inv");

    let err = registry.create("missing", &config).err().unwrap();

    assert!(matches!(err, ProcessorError::ProcessorNotFound(id) if id == "missing"));
}

#[test]
fn factory_errors_are_returned() {
    let mut registry = ProcessorRegistry::new();
    registry
        .register(ProcessorDescription::new("picky", "Picky"), |config| {
            Err(ProcessorError::InvalidProperty {
                processor: "picky".to_string(),
                property: "field".to_string(),
                reason: format!("missing for {}", config.invocation_id),
            })
        })
        .unwrap();
    let config = ProcessorConfig::new("in", "out", "inv-7");

    let err = registry.create("picky", &config).err().unwrap();

    assert_eq!(
        err.to_string(),
        "invalid property field for picky: missing for inv-7"
    );
}

#[tokio::test]
async fn created_processor_runs_hooks() {
    let mut registry = ProcessorRegistry::new();
    registry.register(doubler(), recorder_factory).unwrap();
    let config = ProcessorConfig::new("in", "out", "inv");

    let mut processor = registry.create("doubler", &config).unwrap();
    processor.on_invocation(&config).await;
    let result = processor
        .on_event(Event::try_from(json!({"temp": 4})).unwrap())
        .await;

    assert_eq!(result, Some(json!({"temp": 8})));
}
