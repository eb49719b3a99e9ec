// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message broker adapters
//!
//! The broker client is a black box offering subscribe/poll on the consumer
//! side and produce/poll/flush on the producer side. Both sides can be
//! closed.

#[cfg(feature = "kafka")]
mod kafka;
mod stdio;

#[cfg(feature = "kafka")]
pub use kafka::{KafkaBroker, KafkaConsumer, KafkaProducer};
pub use stdio::{StdioBroker, StdioConsumer, StdioProducer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BrokerCall, FakeBroker, FakeConsumer, FakeProducer, ProducedMessage};

use async_trait::async_trait;
use evp_core::ClientConfig;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a broker client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("broker unreachable: {0}")]
    Unreachable(String),
    /// Benign sentinel: the consumer reached the end of a partition
    #[error("no more messages")]
    EndOfPartition,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("local send queue is full")]
    QueueFull,
    #[error("client closed")]
    Closed,
    #[error("fatal broker error: {0}")]
    Fatal(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl BrokerError {
    pub fn is_end_of_partition(&self) -> bool {
        matches!(self, BrokerError::EndOfPartition)
    }

    /// Whether the client can no longer be used after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrokerError::Fatal(_) | BrokerError::Closed)
    }
}

/// A record delivered by the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    /// Value bytes; `None` for tombstones
    pub payload: Option<Vec<u8>>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            key: None,
            payload: Some(payload.into()),
        }
    }

    pub fn at_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }
}

/// Consumer side of a broker connection
#[async_trait]
pub trait BrokerConsumer: Send + Sync + 'static {
    /// Subscribe to the given topics, replacing any previous subscription
    async fn subscribe(&self, topics: &[String]) -> Result<(), BrokerError>;

    /// Wait up to `timeout` for the next record.
    ///
    /// `None` means nothing arrived in time, which is the normal idle case.
    async fn poll(&self, timeout: Duration) -> Option<Result<Message, BrokerError>>;

    /// Leave the group and release the connection. Safe to call twice.
    async fn close(&self) -> Result<(), BrokerError>;
}

/// Producer side of a broker connection
#[async_trait]
pub trait BrokerProducer: Send + Sync + 'static {
    /// Queue `payload` for delivery to `topic`. Delivery is asynchronous.
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Serve delivery callbacks and free send-queue space for up to `timeout`
    async fn poll(&self, timeout: Duration);

    /// Block until queued sends complete or `timeout` elapses. Safe to call twice.
    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError>;
}

/// Opens consumer and producer clients against one message bus
#[async_trait]
pub trait Broker: Clone + Send + Sync + 'static {
    type Consumer: BrokerConsumer;
    type Producer: BrokerProducer;

    async fn connect_consumer(&self, config: &ClientConfig)
        -> Result<Self::Consumer, BrokerError>;

    async fn connect_producer(&self, config: &ClientConfig)
        -> Result<Self::Producer, BrokerError>;
}
