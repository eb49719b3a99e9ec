// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for processor construction and the consume loop

use evp_adapters::BrokerError;
use evp_core::{ConfigError, DecodeError, TransitionError};
use std::any::Any;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

/// Errors returned to the caller by processor lifecycle operations
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open {client}: {source}")]
    Connect {
        client: &'static str,
        #[source]
        source: BrokerError,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("processor not found: {0}")]
    ProcessorNotFound(String),
    #[error("processor already registered: {0}")]
    DuplicateProcessor(String),
    #[error("invalid property {property} for {processor}: {reason}")]
    InvalidProperty {
        processor: String,
        property: String,
        reason: String,
    },
}

/// Everything that can go wrong inside the consume loop.
///
/// The set is closed: [`LoopError::Fatal`] is the catch-all for failures no
/// other kind describes.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("subscribe to {topic} failed: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: BrokerError,
    },
    #[error("consumer error: {0}")]
    Transport(BrokerError),
    #[error("malformed event: {0}")]
    Decode(#[from] DecodeError),
    #[error("on_event did not finish within {0:?}")]
    DispatchTimeout(Duration),
    #[error("on_event panicked: {0}")]
    DispatchPanic(String),
    #[error("interrupted")]
    Interrupted,
    #[error("{0}")]
    Fatal(String),
}

impl LoopError {
    /// Classify a broker error reported by a poll
    pub fn from_broker(err: BrokerError) -> Self {
        if err.is_fatal() {
            LoopError::Fatal(err.to_string())
        } else {
            LoopError::Transport(err)
        }
    }

    /// Classify the failure of a hook task
    pub fn from_join(err: JoinError) -> Self {
        if err.is_cancelled() {
            return LoopError::Interrupted;
        }
        match err.try_into_panic() {
            Ok(payload) => LoopError::DispatchPanic(panic_message(payload.as_ref())),
            Err(err) => LoopError::Fatal(err.to_string()),
        }
    }

    /// Whether the loop must end after this error
    pub fn is_fatal(&self) -> bool {
        match self {
            LoopError::Transport(_) | LoopError::Decode(_) | LoopError::DispatchTimeout(_) => false,
            LoopError::Subscribe { .. }
            | LoopError::DispatchPanic(_)
            | LoopError::Interrupted
            | LoopError::Fatal(_) => true,
        }
    }

    /// Log at the severity this kind of failure calls for
    pub fn log(&self) {
        match self {
            LoopError::Transport(e) => tracing::error!(error = %e, "consumer error"),
            LoopError::Decode(e) => tracing::info!(error = %e, "discarding malformed event"),
            LoopError::DispatchTimeout(limit) => tracing::error!(
                timeout_ms = limit.as_millis() as u64,
                "on_event timed out; event dropped"
            ),
            LoopError::Interrupted => tracing::info!("consumer: aborted"),
            LoopError::Subscribe { .. } | LoopError::DispatchPanic(_) | LoopError::Fatal(_) => {
                tracing::error!(error = %self, "consumer: fatal error, processor stopped")
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
