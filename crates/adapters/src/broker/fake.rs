// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake broker for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Broker, BrokerConsumer, BrokerError, BrokerProducer, Message};
use async_trait::async_trait;
use evp_core::ClientConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Recorded broker call. Consumer polls are counted, not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerCall {
    ConnectConsumer { config: ClientConfig },
    ConnectProducer { config: ClientConfig },
    Subscribe { topics: Vec<String> },
    CloseConsumer,
    Produce { topic: String },
    PollProducer { timeout: Duration },
    Flush { timeout: Duration },
}

/// A record accepted by the fake producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl ProducedMessage {
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<invalid utf-8>")
    }
}

#[derive(Default)]
struct FakeState {
    inbox: VecDeque<Result<Message, BrokerError>>,
    produced: Vec<ProducedMessage>,
    calls: Vec<BrokerCall>,
    consumer_polls: u64,
    next_offset: i64,
    subscribed: Vec<String>,
    unreachable: bool,
    queue_full: bool,
    consumer_closed: bool,
}

/// Fake broker with a scripted inbox and a recording producer.
///
/// Clones share state, so a test can keep a handle while the engine owns
/// the clients.
#[derive(Clone, Default)]
pub struct FakeBroker {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a payload for the consumer, on the subscribed topic
    pub fn push_payload(&self, payload: impl Into<Vec<u8>>) {
        let mut state = self.state();
        let topic = state
            .subscribed
            .first()
            .cloned()
            .unwrap_or_else(|| "input".to_string());
        let offset = state.next_offset;
        state.next_offset += 1;
        state
            .inbox
            .push_back(Ok(Message::new(topic, payload).at_offset(offset)));
    }

    /// Queue a complete message for the consumer
    pub fn push_message(&self, message: Message) {
        self.state().inbox.push_back(Ok(message));
    }

    /// Queue an error for the consumer to report on a poll
    pub fn push_error(&self, error: BrokerError) {
        self.state().inbox.push_back(Err(error));
    }

    /// Make subsequent connects fail
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Make subsequent produces fail with a full send queue
    pub fn set_queue_full(&self, full: bool) {
        self.state().queue_full = full;
    }

    /// Messages still waiting to be polled
    pub fn pending(&self) -> usize {
        self.state().inbox.len()
    }

    pub fn produced(&self) -> Vec<ProducedMessage> {
        self.state().produced.clone()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.state().calls.clone()
    }

    /// Number of consumer polls served so far
    pub fn consumer_polls(&self) -> u64 {
        self.state().consumer_polls
    }

    pub fn subscribed(&self) -> Vec<String> {
        self.state().subscribed.clone()
    }

    pub fn consumer_closed(&self) -> bool {
        self.state().consumer_closed
    }

    fn record(&self, call: BrokerCall) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl Broker for FakeBroker {
    type Consumer = FakeConsumer;
    type Producer = FakeProducer;

    async fn connect_consumer(&self, config: &ClientConfig) -> Result<FakeConsumer, BrokerError> {
        self.record(BrokerCall::ConnectConsumer {
            config: config.clone(),
        });
        if self.state().unreachable {
            return Err(BrokerError::Unreachable("fake broker is down".to_string()));
        }
        Ok(FakeConsumer {
            broker: self.clone(),
        })
    }

    async fn connect_producer(&self, config: &ClientConfig) -> Result<FakeProducer, BrokerError> {
        self.record(BrokerCall::ConnectProducer {
            config: config.clone(),
        });
        if self.state().unreachable {
            return Err(BrokerError::Unreachable("fake broker is down".to_string()));
        }
        Ok(FakeProducer {
            broker: self.clone(),
        })
    }
}

/// Consumer handed out by [`FakeBroker`]
#[derive(Clone)]
pub struct FakeConsumer {
    broker: FakeBroker,
}

#[async_trait]
impl BrokerConsumer for FakeConsumer {
    async fn subscribe(&self, topics: &[String]) -> Result<(), BrokerError> {
        self.broker.record(BrokerCall::Subscribe {
            topics: topics.to_vec(),
        });
        let mut state = self.broker.state();
        if state.consumer_closed {
            return Err(BrokerError::Closed);
        }
        state.subscribed = topics.to_vec();
        Ok(())
    }

    async fn poll(&self, timeout: Duration) -> Option<Result<Message, BrokerError>> {
        let next = {
            let mut state = self.broker.state();
            state.consumer_polls += 1;
            if state.consumer_closed {
                return Some(Err(BrokerError::Closed));
            }
            state.inbox.pop_front()
        };
        if next.is_none() {
            // Idle poll blocks for its full timeout, like a real client
            tokio::time::sleep(timeout).await;
        }
        next
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.broker.record(BrokerCall::CloseConsumer);
        self.broker.state().consumer_closed = true;
        Ok(())
    }
}

/// Producer handed out by [`FakeBroker`]
#[derive(Clone)]
pub struct FakeProducer {
    broker: FakeBroker,
}

#[async_trait]
impl BrokerProducer for FakeProducer {
    async fn produce(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.broker.record(BrokerCall::Produce {
            topic: topic.to_string(),
        });
        let mut state = self.broker.state();
        if state.queue_full {
            return Err(BrokerError::QueueFull);
        }
        state.produced.push(ProducedMessage {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }

    async fn poll(&self, timeout: Duration) {
        self.broker.record(BrokerCall::PollProducer { timeout });
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        self.broker.record(BrokerCall::Flush { timeout });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
