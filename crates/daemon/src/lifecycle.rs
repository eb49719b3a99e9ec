// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, supervision, shutdown.

use crate::config::DaemonConfig;
use evp_adapters::{Broker, TracedBroker};
use evp_core::{ConfigError, ProcessorState};
use evp_engine::{EventProcessor, ProcessorError, ProcessorInstance, ProcessorRegistry};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// How often the daemon checks whether it should exit on its own
pub const SUPERVISE_INTERVAL: Duration = Duration::from_millis(100);

/// The hosted processor with the daemon's concrete types
pub type DaemonInstance<B> = ProcessorInstance<Box<dyn EventProcessor>, TracedBroker<B>>;

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),

    #[error("broker kind {0} is not available in this build")]
    BrokerUnavailable(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the daemon decided to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal(&'static str),
    /// The stdio broker reached the end of its input
    InputExhausted,
    /// The consume loop ended on a fatal error
    ProcessorStopped,
}

/// A started daemon hosting one processor
pub struct Daemon<B: Broker> {
    pub instance: DaemonInstance<B>,
}

/// Build the configured processor, connect it and start consuming
pub async fn startup<B: Broker>(
    config: &DaemonConfig,
    registry: &ProcessorRegistry,
    broker: B,
) -> Result<Daemon<B>, LifecycleError> {
    let processor_config = config.processor_config();
    let processor = registry.create(&config.processor, &processor_config)?;

    let broker = TracedBroker::new(broker);
    let mut instance = ProcessorInstance::construct(processor_config, &broker, processor).await?;
    instance.init()?;

    info!(
        processor = %config.processor,
        invocation_id = %instance.invocation_id(),
        "daemon started"
    );
    Ok(Daemon { instance })
}

impl<B: Broker> Daemon<B> {
    /// Reason to exit without a signal, if any.
    ///
    /// Exhausted input only ends the run once every staged event has been
    /// dispatched.
    pub fn check(&self, input_exhausted: bool) -> Option<ExitReason> {
        if self.instance.state() == ProcessorState::Stopped {
            return Some(ExitReason::ProcessorStopped);
        }
        (input_exhausted && self.instance.is_idle()).then_some(ExitReason::InputExhausted)
    }

    /// Stop the processor and release the broker clients
    pub async fn shutdown(&mut self, reason: ExitReason) {
        info!(?reason, "shutting down");
        self.instance.stop().await;
        if reason == ExitReason::ProcessorStopped {
            warn!("processor stopped after a fatal error");
        }
        info!("daemon shutdown complete");
    }
}

/// Wait until `signal` fires or the daemon has a reason to exit on its own
pub async fn supervise<B, S>(
    daemon: &Daemon<B>,
    signal: S,
    input_exhausted: impl Fn() -> bool,
) -> ExitReason
where
    B: Broker,
    S: Future<Output = &'static str>,
{
    tokio::pin!(signal);
    let mut ticker = tokio::time::interval(SUPERVISE_INTERVAL);
    loop {
        tokio::select! {
            name = &mut signal => return ExitReason::Signal(name),
            _ = ticker.tick() => {
                if let Some(reason) = daemon.check(input_exhausted()) {
                    return reason;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
