// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use evp_adapters::{BrokerCall, FakeBroker};
use evp_core::SequentialIdGen;

fn config() -> ProcessorConfig {
    ProcessorConfig::new("in", "out", "inv-1").with_bootstrap_servers("broker:9092")
}

#[tokio::test]
async fn open_connects_both_clients_with_merged_config() {
    let broker = FakeBroker::new();
    let pair = BrokerClientPair::open(&broker, &config(), &SequentialIdGen::new("g"))
        .await
        .unwrap();

    assert_eq!(pair.consumer_config.group_id(), Some("evp_g-1"));
    assert_eq!(pair.consumer_config.bootstrap_servers(), Some("broker:9092"));
    assert_eq!(pair.producer_config.bootstrap_servers(), Some("broker:9092"));

    let calls = broker.calls();
    assert!(matches!(
        calls.as_slice(),
        [BrokerCall::ConnectConsumer { .. }, BrokerCall::ConnectProducer { .. }]
    ));
}

#[tokio::test]
async fn each_pair_gets_its_own_group() {
    let broker = FakeBroker::new();
    let ids = SequentialIdGen::new("g");

    let first = BrokerClientPair::open(&broker, &config(), &ids).await.unwrap();
    let second = BrokerClientPair::open(&broker, &config(), &ids).await.unwrap();

    assert_ne!(
        first.consumer_config.group_id(),
        second.consumer_config.group_id()
    );
}

#[tokio::test]
async fn unreachable_broker_fails_fast() {
    let broker = FakeBroker::new();
    broker.set_unreachable(true);

    let result = BrokerClientPair::open(&broker, &config(), &SequentialIdGen::new("g")).await;

    assert!(matches!(
        result,
        Err(ProcessorError::Connect {
            client: "consumer",
            ..
        })
    ));
    // One attempt, no retries
    assert_eq!(broker.calls().len(), 1);
}
