// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consumer and producer connections owned by one processor instance

use crate::error::ProcessorError;
use evp_adapters::{Broker, BrokerConsumer};
use evp_core::{ClientConfig, IdGen, ProcessorConfig, GROUP_ID_PREFIX};
use std::sync::Arc;
use tracing::warn;

/// One consumer and one producer opened with merged configuration
pub struct BrokerClientPair<B: Broker> {
    pub consumer: Arc<B::Consumer>,
    pub producer: Arc<B::Producer>,
    pub consumer_config: ClientConfig,
    pub producer_config: ClientConfig,
}

impl<B: Broker> BrokerClientPair<B> {
    /// Open both clients. A fresh consumer group is drawn from `id_gen`.
    ///
    /// Fails fast if either client cannot connect; nothing is retried.
    pub async fn open(
        broker: &B,
        config: &ProcessorConfig,
        id_gen: &impl IdGen,
    ) -> Result<Self, ProcessorError> {
        let group_id = format!("{}{}", GROUP_ID_PREFIX, id_gen.next());
        let consumer_config = ClientConfig::consumer(config, &group_id);
        let producer_config = ClientConfig::producer(config);

        let consumer = broker
            .connect_consumer(&consumer_config)
            .await
            .map_err(|source| ProcessorError::Connect {
                client: "consumer",
                source,
            })?;

        let producer = match broker.connect_producer(&producer_config).await {
            Ok(producer) => producer,
            Err(source) => {
                if let Err(e) = consumer.close().await {
                    warn!(error = %e, "failed to close consumer after producer connect failed");
                }
                return Err(ProcessorError::Connect {
                    client: "producer",
                    source,
                });
            }
        };

        Ok(Self {
            consumer: Arc::new(consumer),
            producer: Arc::new(producer),
            consumer_config,
            producer_config,
        })
    }
}

#[cfg(test)]
#[path = "clients_tests.rs"]
mod tests;
