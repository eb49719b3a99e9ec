// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use yare::parameterized;

const FULL_CONFIG: &str = r#"
input_topic = "sensors"
output_topic = "sensors-scaled"
invocation_id = "6f1c6a3e-2a41-4c55-9d0e-0d2c1f1b9a77"
bootstrap_servers = "broker:9092"

[static_properties]
field = "temp"
factor = 2

[consumer]
"auto.offset.reset" = "earliest"

[producer]
"linger.ms" = "5"

[runtime]
poll_timeout = "250ms"
flush_timeout = "5s"
dispatch_timeout = "2s"

[runtime.dispatch]
mode = "staged"
capacity = 64
"#;

#[test]
fn parses_full_config() {
    let config = ProcessorConfig::from_toml(FULL_CONFIG).unwrap();

    assert_eq!(config.input_topic, "sensors");
    assert_eq!(config.output_topic, "sensors-scaled");
    assert_eq!(config.bootstrap_servers.as_deref(), Some("broker:9092"));
    assert_eq!(config.property("field"), Some(&Value::from("temp")));
    assert_eq!(config.property("factor"), Some(&Value::from(2)));
    assert_eq!(
        config.consumer.get("auto.offset.reset").map(String::as_str),
        Some("earliest")
    );
    assert_eq!(config.producer.get("linger.ms").map(String::as_str), Some("5"));
    assert_eq!(config.runtime.poll_timeout, Duration::from_millis(250));
    assert_eq!(config.runtime.flush_timeout, Duration::from_secs(5));
    assert_eq!(config.runtime.dispatch_timeout, Some(Duration::from_secs(2)));
    assert_eq!(config.runtime.dispatch, DispatchMode::Staged { capacity: 64 });
}

#[test]
fn minimal_config_uses_defaults() {
    let config = ProcessorConfig::from_toml(
        r#"
input_topic = "in"
output_topic = "out"
invocation_id = "inv"
"#,
    )
    .unwrap();

    assert_eq!(config.bootstrap_servers, None);
    assert!(config.static_properties.is_empty());
    assert_eq!(config.runtime, RuntimeSettings::default());
    assert_eq!(config.runtime.poll_timeout, Duration::from_secs(1));
    assert_eq!(config.runtime.dispatch, DispatchMode::Inline);
}

#[test]
fn unknown_keys_are_rejected() {
    let result = ProcessorConfig::from_toml(
        r#"
input_topic = "in"
output_topic = "out"
invocation_id = "inv"
input_topics = ["typo"]
"#,
    );
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[parameterized(
    empty_input = { "", "out", "inv" },
    empty_output = { "in", " ", "inv" },
    empty_invocation = { "in", "out", "" },
)]
fn blank_identity_fields_are_invalid(input: &str, output: &str, invocation: &str) {
    let config = ProcessorConfig::new(input, output, invocation);
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn staged_dispatch_needs_capacity() {
    let runtime = RuntimeSettings {
        dispatch: DispatchMode::Staged { capacity: 0 },
        ..RuntimeSettings::default()
    };
    let config = ProcessorConfig::new("in", "out", "inv").with_runtime(runtime);

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("capacity"));
}

#[test]
fn zero_poll_timeout_is_invalid() {
    let runtime = RuntimeSettings {
        poll_timeout: Duration::ZERO,
        ..RuntimeSettings::default()
    };
    let config = ProcessorConfig::new("in", "out", "inv").with_runtime(runtime);
    assert!(config.validate().is_err());
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processor.toml");
    std::fs::write(&path, FULL_CONFIG).unwrap();

    let config = ProcessorConfig::load(&path).unwrap();
    assert_eq!(config.invocation_id, "6f1c6a3e-2a41-4c55-9d0e-0d2c1f1b9a77");
}

#[test]
fn load_reports_missing_file() {
    let result = ProcessorConfig::load(Path::new("/nonexistent/processor.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}
