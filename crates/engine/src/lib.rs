// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Event processor runtime
//!
//! Hosts an [`EventProcessor`] between an input and an output topic:
//! polls the consumer, decodes payloads into events, calls the hooks and
//! publishes what they return.

mod clients;
mod consume;
mod dispatch;
mod error;
mod instance;
mod processor;
mod produce;
mod queue;
mod registry;

#[cfg(test)]
mod testing;

pub use clients::BrokerClientPair;
pub use consume::{ConsumeLoop, EventSink, LoopStatus};
pub use dispatch::{Dispatched, Dispatcher};
pub use error::{LoopError, ProcessorError};
pub use instance::{ProcessorInstance, CONSUME_TASK, DISPATCH_TASK};
pub use processor::EventProcessor;
pub use produce::ProducePath;
pub use queue::{Backlog, EventQueue, Handoff, QueueReceiver, QueueSender, Received};
pub use registry::{ProcessorDescription, ProcessorFactory, ProcessorRegistry};
