// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::broker::FakeBroker;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn consumer_config() -> ClientConfig {
    ClientConfig::default()
        .with("bootstrap.servers", "broker:9092")
        .with("group.id", "evp_test")
}

// =============================================================================
// Connection logging
// =============================================================================

#[test]
fn traced_connect_logs_span_fields() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedBroker::new(FakeBroker::new());
        traced.connect_consumer(&consumer_config()).await.map(|_| ())
    });

    assert!(result.is_ok());
    assert!(logs.contains("broker.connect_consumer"), "logs: {}", logs);
    assert!(logs.contains("bootstrap=\"broker:9092\"") || logs.contains("bootstrap=broker:9092"));
    assert!(logs.contains("group=\"evp_test\"") || logs.contains("group=evp_test"));
    assert!(logs.contains("consumer connected"));
}

#[test]
fn traced_connect_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeBroker::new();
        fake.set_unreachable(true);
        let traced = TracedBroker::new(fake);
        traced
            .connect_producer(&ClientConfig::default())
            .await
            .map(|_| ())
    });

    assert!(matches!(result, Err(BrokerError::Unreachable(_))));
    assert!(logs.contains("producer connect failed"), "logs: {}", logs);
    assert!(logs.contains("ERROR"));
}

// =============================================================================
// Client call logging
// =============================================================================

#[test]
fn traced_producer_logs_rejection() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeBroker::new();
        fake.set_queue_full(true);
        let traced = TracedBroker::new(fake);
        let producer = traced
            .connect_producer(&ClientConfig::default())
            .await
            .unwrap();
        producer.produce("out", b"{}".to_vec()).await
    });

    assert_eq!(result, Err(BrokerError::QueueFull));
    assert!(logs.contains("produce rejected"), "logs: {}", logs);
    assert!(logs.contains("bytes=2"));
}

#[test]
fn traced_consumer_logs_polled_message() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeBroker::new();
        let traced = TracedBroker::new(fake.clone());
        let consumer = traced.connect_consumer(&consumer_config()).await.unwrap();
        consumer.subscribe(&["sensors".to_string()]).await.unwrap();
        fake.push_payload(r#"{"temp":21}"#);
        consumer.poll(Duration::from_millis(1)).await
    });

    assert!(matches!(result, Some(Ok(_))));
    assert!(logs.contains("subscribed"), "logs: {}", logs);
    assert!(logs.contains("polled"));
    assert!(logs.contains("offset=0"));
}

#[tokio::test]
async fn traced_wrappers_delegate_to_inner() {
    let fake = FakeBroker::new();
    let traced = TracedBroker::new(fake.clone());

    let producer = traced
        .connect_producer(&ClientConfig::default())
        .await
        .unwrap();
    producer.produce("out", b"[1]".to_vec()).await.unwrap();
    producer.flush(Duration::from_secs(1)).await.unwrap();

    let consumer = traced
        .connect_consumer(&ClientConfig::default())
        .await
        .unwrap();
    consumer.close().await.unwrap();

    assert_eq!(fake.produced().len(), 1);
    assert!(fake.consumer_closed());
    assert!(fake
        .calls()
        .iter()
        .any(|c| matches!(c, crate::broker::BrokerCall::Flush { .. })));
}
