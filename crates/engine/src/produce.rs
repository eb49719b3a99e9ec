// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publishing results to the output topic.

use evp_adapters::{BrokerError, BrokerProducer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Serializes results and hands them to the producer.
///
/// Sends are fire-and-forget. When the producer's send queue is full the
/// producer is polled once for `backoff` to make room and the result is
/// dropped; it is never re-submitted.
pub struct ProducePath<P> {
    producer: Arc<P>,
    topic: String,
    backoff: Duration,
}

impl<P: BrokerProducer> ProducePath<P> {
    pub fn new(producer: Arc<P>, topic: impl Into<String>, backoff: Duration) -> Self {
        Self {
            producer,
            topic: topic.into(),
            backoff,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn produce(&self, result: &Value) {
        let payload = match serde_json::to_vec(result) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to serialize result; dropped");
                return;
            }
        };

        match self.producer.produce(&self.topic, payload).await {
            Ok(()) => debug!(topic = %self.topic, "result queued"),
            Err(BrokerError::QueueFull) => {
                warn!(
                    topic = %self.topic,
                    backoff_ms = self.backoff.as_millis() as u64,
                    "send queue full; result dropped"
                );
                self.producer.poll(self.backoff).await;
            }
            Err(e) => warn!(topic = %self.topic, error = %e, "produce failed; result dropped"),
        }
    }
}

#[cfg(test)]
#[path = "produce_tests.rs"]
mod tests;
