// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use evp_core::DispatchMode;
use std::time::Duration;

const MINIMAL: &str = r#"
processor = "passthrough"

[invocation]
input_topic = "in"
output_topic = "out"
invocation_id = "inv-1"
"#;

#[test]
fn minimal_config_defaults_to_stdio() {
    let config = DaemonConfig::from_toml(MINIMAL).unwrap();

    assert_eq!(config.processor, "passthrough");
    assert_eq!(config.broker, BrokerSettings::default());
    assert_eq!(config.broker.kind, BrokerKind::Stdio);
    assert!(config.log_path.is_none());
    assert!(config.processor_config().bootstrap_servers.is_none());
}

#[test]
fn full_config_parses() {
    let config = DaemonConfig::from_toml(
        r#"
processor = "field-scale"
log_path = "/var/log/evpd.log"

[broker]
kind = "kafka"
host = "kafka.internal"
port = 19092

[invocation]
input_topic = "sensors"
output_topic = "scaled"
invocation_id = "inv-9"

[invocation.static_properties]
field = "temp"
factor = 3

[invocation.runtime]
poll_timeout = "250ms"
dispatch = { mode = "staged", capacity = 16 }
"#,
    )
    .unwrap();

    assert_eq!(config.broker.kind, BrokerKind::Kafka);
    assert_eq!(config.log_path, Some(PathBuf::from("/var/log/evpd.log")));
    let invocation = config.processor_config();
    assert_eq!(
        invocation.bootstrap_servers.as_deref(),
        Some("kafka.internal:19092")
    );
    assert_eq!(invocation.runtime.poll_timeout, Duration::from_millis(250));
    assert_eq!(
        invocation.runtime.dispatch,
        DispatchMode::Staged { capacity: 16 }
    );
    assert_eq!(invocation.property("factor"), Some(&serde_json::json!(3)));
}

#[test]
fn broker_host_without_port_uses_default_port() {
    let settings = BrokerSettings {
        host: Some("kafka".to_string()),
        ..BrokerSettings::default()
    };
    assert_eq!(settings.bootstrap_servers().as_deref(), Some("kafka:9092"));
}

#[test]
fn broker_host_replaces_invocation_bootstrap_servers() {
    let config = DaemonConfig::from_toml(
        r#"
processor = "passthrough"

[broker]
host = "override"

[invocation]
input_topic = "in"
output_topic = "out"
invocation_id = "inv-1"
bootstrap_servers = "original:9092"
"#,
    )
    .unwrap();

    assert_eq!(
        config.processor_config().bootstrap_servers.as_deref(),
        Some("override:9092")
    );
}

#[yare::parameterized(
    empty_processor = { r#"
processor = " "
[invocation]
input_topic = "in"
output_topic = "out"
invocation_id = "inv"
"# },
    port_without_host = { r#"
processor = "passthrough"
[broker]
port = 9093
[invocation]
input_topic = "in"
output_topic = "out"
invocation_id = "inv"
"# },
    blank_input_topic = { r#"
processor = "passthrough"
[invocation]
input_topic = ""
output_topic = "out"
invocation_id = "inv"
"# },
)]
fn invalid_configs_are_rejected(content: &str) {
    assert!(matches!(
        DaemonConfig::from_toml(content),
        Err(ConfigError::Invalid(_))
    ));
}

#[yare::parameterized(
    missing_invocation = { r#"processor = "passthrough""# },
    unknown_key = { r#"
processor = "passthrough"
colour = "blue"
[invocation]
input_topic = "in"
output_topic = "out"
invocation_id = "inv"
"# },
    unknown_broker_kind = { r#"
processor = "passthrough"
[broker]
kind = "carrier-pigeon"
[invocation]
input_topic = "in"
output_topic = "out"
invocation_id = "inv"
"# },
)]
fn malformed_configs_fail_to_parse(content: &str) {
    assert!(matches!(
        DaemonConfig::from_toml(content),
        Err(ConfigError::Toml(_))
    ));
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let err = DaemonConfig::load(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Io { path: p, .. } if p == path));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evpd.toml");
    std::fs::write(&path, MINIMAL).unwrap();

    let config = DaemonConfig::load(&path).unwrap();

    assert_eq!(config.invocation.invocation_id, "inv-1");
}
