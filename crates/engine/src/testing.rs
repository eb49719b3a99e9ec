// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processors and helpers shared by the engine's unit tests

use crate::processor::EventProcessor;
use async_trait::async_trait;
use evp_core::{Event, ProcessorConfig};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hook calls observed by a [`Recorder`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Hook {
    Invocation(String),
    Event(Value),
    Detach,
}

/// How a [`Recorder`] answers `on_event`
#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    /// Double the `temp` field, or echo the event if it has none
    DoubleTemp,
    Suppress,
    ReturnNull,
    Panic,
    Hang,
}

#[derive(Clone)]
pub(crate) struct Recorder {
    behavior: Behavior,
    hooks: Arc<Mutex<Vec<Hook>>>,
}

impl Recorder {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            hooks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn hooks(&self) -> Vec<Hook> {
        self.hooks.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn events(&self) -> Vec<Value> {
        self.hooks()
            .into_iter()
            .filter_map(|h| match h {
                Hook::Event(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn detach_count(&self) -> usize {
        self.hooks()
            .iter()
            .filter(|h| matches!(h, Hook::Detach))
            .count()
    }

    fn record(&self, hook: Hook) {
        self.hooks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(hook);
    }
}

#[async_trait]
impl EventProcessor for Recorder {
    async fn on_invocation(&mut self, config: &ProcessorConfig) {
        self.record(Hook::Invocation(config.invocation_id.clone()));
    }

    async fn on_event(&mut self, event: Event) -> Option<Value> {
        self.record(Hook::Event(event.as_value().clone()));
        match self.behavior {
            Behavior::DoubleTemp => {
                let mut value = event.into_value();
                if let Some(temp) = value.get("temp").and_then(Value::as_i64) {
                    value["temp"] = Value::from(temp * 2);
                }
                Some(value)
            }
            Behavior::Suppress => None,
            Behavior::ReturnNull => Some(Value::Null),
            Behavior::Panic => panic!("hook exploded"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                None
            }
        }
    }

    async fn on_detach(&mut self) {
        self.record(Hook::Detach);
    }
}

/// Poll `check` until it holds or `limit` passes
pub(crate) async fn wait_until(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Log output captured by a thread-local subscriber
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub(crate) fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&logs).to_string()
    }

    /// Install as the default subscriber until the guard drops.
    ///
    /// Only events on the current thread are captured, which covers every
    /// task of a current-thread runtime.
    pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
