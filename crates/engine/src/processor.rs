// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hooks a user-defined processor implements.

use async_trait::async_trait;
use evp_core::{Event, ProcessorConfig};
use serde_json::Value;

/// User logic hosted by a [`ProcessorInstance`](crate::ProcessorInstance).
///
/// These hooks are the only extension points; polling, decoding and
/// publishing are handled by the runtime.
#[async_trait]
pub trait EventProcessor: Send + 'static {
    /// Called once while the instance is constructed, before any event.
    /// Use it for one-time setup such as reading static properties.
    async fn on_invocation(&mut self, config: &ProcessorConfig);

    /// Transform one well-formed event.
    ///
    /// Returning `None` (or JSON `null`) publishes nothing. There is no
    /// deadline unless `runtime.dispatch_timeout` is set, so implementations
    /// should return promptly for shutdown to stay timely.
    async fn on_event(&mut self, event: Event) -> Option<Value>;

    /// Called once when the instance is stopped
    async fn on_detach(&mut self);
}

#[async_trait]
impl EventProcessor for Box<dyn EventProcessor> {
    async fn on_invocation(&mut self, config: &ProcessorConfig) {
        (**self).on_invocation(config).await
    }

    async fn on_event(&mut self, event: Event) -> Option<Value> {
        (**self).on_event(event).await
    }

    async fn on_detach(&mut self) {
        (**self).on_detach().await
    }
}
