// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kafka broker backed by librdkafka.

use super::{Broker, BrokerConsumer, BrokerError, BrokerProducer, Message};
use async_trait::async_trait;
use evp_core::ClientConfig;
use rdkafka::config::ClientConfig as RdConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use rdkafka::Message as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long connecting waits for cluster metadata before giving up
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens rdkafka clients. Connecting probes cluster metadata so an
/// unreachable broker fails construction instead of the first poll.
#[derive(Clone, Copy, Debug, Default)]
pub struct KafkaBroker;

impl KafkaBroker {
    pub fn new() -> Self {
        Self
    }
}

fn rd_config(config: &ClientConfig) -> RdConfig {
    let mut rd = RdConfig::new();
    for (key, value) in config.iter() {
        rd.set(key, value);
    }
    rd
}

fn map_error(err: KafkaError) -> BrokerError {
    match err {
        KafkaError::PartitionEOF(_) => BrokerError::EndOfPartition,
        KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull) => BrokerError::QueueFull,
        err @ KafkaError::ClientConfig(..) => BrokerError::Config(err.to_string()),
        other if other.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal) => {
            BrokerError::Fatal(other.to_string())
        }
        other => BrokerError::Transport(other.to_string()),
    }
}

fn unreachable(err: KafkaError) -> BrokerError {
    BrokerError::Unreachable(err.to_string())
}

/// Run a blocking metadata request off the runtime
async fn check_reachable<F>(fetch: F) -> Result<(), BrokerError>
where
    F: FnOnce() -> Result<(), KafkaError> + Send + 'static,
{
    tokio::task::spawn_blocking(fetch)
        .await
        .map_err(|e| BrokerError::Transport(e.to_string()))?
        .map_err(unreachable)
}

#[async_trait]
impl Broker for KafkaBroker {
    type Consumer = KafkaConsumer;
    type Producer = KafkaProducer;

    async fn connect_consumer(&self, config: &ClientConfig) -> Result<KafkaConsumer, BrokerError> {
        let consumer: StreamConsumer = rd_config(config).create().map_err(map_error)?;
        let consumer = Arc::new(consumer);

        let probe = Arc::clone(&consumer);
        check_reachable(move || {
            probe.fetch_metadata(None, CONNECT_TIMEOUT).map(|_| ())
        })
        .await?;

        Ok(KafkaConsumer {
            inner: consumer,
            closed: AtomicBool::new(false),
        })
    }

    async fn connect_producer(&self, config: &ClientConfig) -> Result<KafkaProducer, BrokerError> {
        let producer: BaseProducer = rd_config(config).create().map_err(map_error)?;
        let producer = Arc::new(producer);

        let probe = Arc::clone(&producer);
        check_reachable(move || {
            probe
                .client()
                .fetch_metadata(None, CONNECT_TIMEOUT)
                .map(|_| ())
        })
        .await?;

        Ok(KafkaProducer { inner: producer })
    }
}

/// Consumer over an rdkafka `StreamConsumer`
pub struct KafkaConsumer {
    inner: Arc<StreamConsumer>,
    closed: AtomicBool,
}

#[async_trait]
impl BrokerConsumer for KafkaConsumer {
    async fn subscribe(&self, topics: &[String]) -> Result<(), BrokerError> {
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.inner.subscribe(&topics).map_err(map_error)
    }

    async fn poll(&self, timeout: Duration) -> Option<Result<Message, BrokerError>> {
        if self.closed.load(Ordering::Acquire) {
            return Some(Err(BrokerError::Closed));
        }
        match tokio::time::timeout(timeout, self.inner.recv()).await {
            Err(_) => None,
            Ok(Ok(msg)) => Some(Ok(Message {
                topic: msg.topic().to_string(),
                partition: msg.partition(),
                offset: msg.offset(),
                key: msg.key().map(<[u8]>::to_vec),
                payload: msg.payload().map(<[u8]>::to_vec),
            })),
            Ok(Err(e)) => Some(Err(map_error(e))),
        }
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.inner.unsubscribe();
        }
        Ok(())
    }
}

/// Producer over an rdkafka `BaseProducer`
pub struct KafkaProducer {
    inner: Arc<BaseProducer>,
}

#[async_trait]
impl BrokerProducer for KafkaProducer {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let record = BaseRecord::<(), [u8]>::to(topic).payload(payload.as_slice());
        self.inner.send(record).map_err(|(e, _)| map_error(e))
    }

    async fn poll(&self, timeout: Duration) {
        let producer = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || producer.poll(timeout)).await {
            tracing::warn!(error = %e, "producer poll task failed");
        }
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        let producer = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| BrokerError::Transport(e.to_string()))?
            .map_err(map_error)
    }
}
