// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::broker::{Broker, BrokerConsumer, BrokerError, BrokerProducer, Message};
use async_trait::async_trait;
use evp_core::ClientConfig;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Wrapper that adds tracing to any Broker and the clients it opens
#[derive(Clone)]
pub struct TracedBroker<B> {
    inner: B,
}

impl<B> TracedBroker<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: Broker> Broker for TracedBroker<B> {
    type Consumer = TracedConsumer<B::Consumer>;
    type Producer = TracedProducer<B::Producer>;

    async fn connect_consumer(
        &self,
        config: &ClientConfig,
    ) -> Result<Self::Consumer, BrokerError> {
        let span = tracing::info_span!(
            "broker.connect_consumer",
            bootstrap = config.bootstrap_servers().unwrap_or("-"),
            group = config.group_id().unwrap_or("-"),
        );
        async {
            tracing::info!(settings = config.len(), "connecting");
            let start = Instant::now();
            let result = self.inner.connect_consumer(config).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "consumer connected"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "consumer connect failed"),
            }
            result.map(TracedConsumer::new)
        }
        .instrument(span)
        .await
    }

    async fn connect_producer(
        &self,
        config: &ClientConfig,
    ) -> Result<Self::Producer, BrokerError> {
        let span = tracing::info_span!(
            "broker.connect_producer",
            bootstrap = config.bootstrap_servers().unwrap_or("-"),
        );
        async {
            tracing::info!(settings = config.len(), "connecting");
            let start = Instant::now();
            let result = self.inner.connect_producer(config).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "producer connected"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "producer connect failed"),
            }
            result.map(TracedProducer::new)
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any BrokerConsumer
pub struct TracedConsumer<C> {
    inner: C,
}

impl<C> TracedConsumer<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C: BrokerConsumer> BrokerConsumer for TracedConsumer<C> {
    async fn subscribe(&self, topics: &[String]) -> Result<(), BrokerError> {
        let result = self.inner.subscribe(topics).await;
        match &result {
            Ok(()) => tracing::info!(topics = ?topics, "subscribed"),
            Err(e) => tracing::error!(topics = ?topics, error = %e, "subscribe failed"),
        }
        result
    }

    async fn poll(&self, timeout: Duration) -> Option<Result<Message, BrokerError>> {
        let result = self.inner.poll(timeout).await;
        if let Some(Ok(message)) = &result {
            tracing::trace!(
                topic = %message.topic,
                partition = message.partition,
                offset = message.offset,
                bytes = message.payload_len(),
                "polled"
            );
        }
        result
    }

    async fn close(&self) -> Result<(), BrokerError> {
        let result = self.inner.close().await;
        // close() failing is often acceptable (connection already gone)
        match &result {
            Ok(()) => tracing::info!("consumer closed"),
            Err(e) => tracing::warn!(error = %e, "consumer close failed (may be expected)"),
        }
        result
    }
}

/// Wrapper that adds tracing to any BrokerProducer
pub struct TracedProducer<P> {
    inner: P,
}

impl<P> TracedProducer<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: BrokerProducer> BrokerProducer for TracedProducer<P> {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let bytes = payload.len();
        let result = self.inner.produce(topic, payload).await;
        match &result {
            Ok(()) => tracing::debug!(topic, bytes, "queued"),
            Err(e) => tracing::warn!(topic, bytes, error = %e, "produce rejected"),
        }
        result
    }

    async fn poll(&self, timeout: Duration) {
        tracing::trace!(timeout_ms = timeout.as_millis() as u64, "polling producer");
        self.inner.poll(timeout).await;
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        let span = tracing::info_span!("producer.flush", timeout_ms = timeout.as_millis() as u64);
        async {
            let start = Instant::now();
            let result = self.inner.flush(timeout).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "flushed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "flush failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
