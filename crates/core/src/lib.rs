// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! evp-core: data model for the event processor runtime
//!
//! This crate provides:
//! - Processor configuration and its TOML loading
//! - Broker client configuration merged from immutable defaults
//! - Event decoding and validation
//! - Pure state machines for processor and consume-loop lifecycles

pub mod client;
pub mod config;
pub mod event;
pub mod id;
pub mod kind;
pub mod settings;
pub mod state;

pub use client::{ClientConfig, CONSUMER_DEFAULTS, GROUP_ID_PREFIX, PRODUCER_DEFAULTS};
pub use config::{ConfigError, ProcessorConfig};
pub use event::{DecodeError, Event};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use kind::ProcessorKind;
pub use settings::{DispatchMode, RuntimeSettings};
pub use state::{LoopState, ProcessorEvent, ProcessorState, TransitionError};
