// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The consume loop: poll, decode, hand off.

use crate::dispatch::Dispatcher;
use crate::error::LoopError;
use crate::processor::EventProcessor;
use crate::queue::{Handoff, QueueSender};
use evp_adapters::{BrokerConsumer, BrokerError, BrokerProducer, Message};
use evp_core::{DecodeError, Event, LoopState};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Shared view of where the consume loop is
#[derive(Clone, Debug, Default)]
pub struct LoopStatus(Arc<AtomicU8>);

impl LoopStatus {
    pub fn get(&self) -> LoopState {
        LoopState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: LoopState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Move from `from` to `to`; any other current state is kept
    pub(crate) fn advance(&self, from: LoopState, to: LoopState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Where decoded events go
pub enum EventSink<P, Pr> {
    /// Call `on_event` on the consume task itself
    Inline(Dispatcher<P, Pr>),
    /// Hand off to a separate dispatch task
    Staged(QueueSender),
}

pub struct ConsumeLoop<C, P, Pr> {
    consumer: Arc<C>,
    topic: String,
    sink: EventSink<P, Pr>,
    running: Arc<AtomicBool>,
    status: LoopStatus,
    poll_timeout: Duration,
}

impl<C, P, Pr> ConsumeLoop<C, P, Pr>
where
    C: BrokerConsumer,
    P: EventProcessor,
    Pr: BrokerProducer,
{
    pub fn new(
        consumer: Arc<C>,
        topic: impl Into<String>,
        sink: EventSink<P, Pr>,
        running: Arc<AtomicBool>,
        status: LoopStatus,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            consumer,
            topic: topic.into(),
            sink,
            running,
            status,
            poll_timeout,
        }
    }

    /// Run until the running flag is cleared or a fatal error occurs.
    ///
    /// Every failure is logged here; nothing is returned to the caller.
    pub async fn run(self) {
        let topics = [self.topic.clone()];
        if let Err(source) = self.consumer.subscribe(&topics).await {
            self.fail(LoopError::Subscribe {
                topic: self.topic.clone(),
                source,
            });
            return;
        }
        info!(topic = %self.topic, "consumer subscribed");
        self.status.set(LoopState::Polling);

        while self.running.load(Ordering::Acquire) {
            let polled = self.consumer.poll(self.poll_timeout).await;
            // stop() may have landed while the poll was blocked
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            let Some(polled) = polled else {
                trace!("poll timed out");
                continue;
            };
            if let Err(e) = self.handle(polled).await {
                if e.is_fatal() {
                    self.fail(e);
                    return;
                }
                e.log();
            }
        }

        // A fatal staged dispatch has already reported Stopped
        self.status.advance(LoopState::Polling, LoopState::Draining);
        debug!(topic = %self.topic, "consume loop finished");
    }

    async fn handle(&self, polled: Result<Message, BrokerError>) -> Result<(), LoopError> {
        let message = match polled {
            Ok(message) => message,
            Err(e) if e.is_end_of_partition() => {
                debug!(topic = %self.topic, "reached end of partition");
                return Ok(());
            }
            Err(e) => return Err(LoopError::from_broker(e)),
        };

        trace!(
            offset = message.offset,
            bytes = message.payload_len(),
            "message received"
        );
        let payload = message.payload.as_deref().ok_or(DecodeError::EmptyPayload)?;
        let event = Event::decode(payload)?;

        match &self.sink {
            EventSink::Inline(dispatcher) => {
                dispatcher.dispatch(event).await?;
            }
            EventSink::Staged(queue) => match queue.send(event, &self.running).await {
                Handoff::Sent => {}
                Handoff::Abandoned => debug!("stopping; event not handed off"),
                Handoff::Closed => {
                    return Err(LoopError::Fatal("dispatch task is gone".to_string()))
                }
            },
        }
        Ok(())
    }

    fn fail(&self, err: LoopError) {
        err.log();
        self.running.store(false, Ordering::Release);
        self.status.set(LoopState::Stopped);
    }
}

#[cfg(test)]
#[path = "consume_tests.rs"]
mod tests;
