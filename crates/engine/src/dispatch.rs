// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invoking `on_event` and publishing what it returns.
//!
//! Each call runs in its own task so a panicking hook surfaces as
//! [`LoopError::DispatchPanic`] and an optional deadline can abort a hook
//! that never returns.

use crate::consume::LoopStatus;
use crate::error::LoopError;
use crate::produce::ProducePath;
use crate::processor::EventProcessor;
use crate::queue::{QueueReceiver, Received};
use evp_adapters::BrokerProducer;
use evp_core::{Event, LoopState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::{debug, info};

/// What a successful dispatch did with the hook's result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Produced,
    Suppressed,
}

/// Abort handle of the hook call currently running, if any
#[derive(Clone, Default)]
pub(crate) struct InFlight(Arc<Mutex<Option<AbortHandle>>>);

impl InFlight {
    fn set(&self, handle: Option<AbortHandle>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = handle;
    }

    /// Abort the running hook call. Returns whether one was running.
    pub(crate) fn abort(&self) -> bool {
        match self.0.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

pub struct Dispatcher<P, Pr> {
    processor: Arc<tokio::sync::Mutex<P>>,
    produce: ProducePath<Pr>,
    timeout: Option<Duration>,
    in_flight: InFlight,
}

impl<P: EventProcessor, Pr: BrokerProducer> Dispatcher<P, Pr> {
    pub fn new(
        processor: Arc<tokio::sync::Mutex<P>>,
        produce: ProducePath<Pr>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            processor,
            produce,
            timeout,
            in_flight: InFlight::default(),
        }
    }

    pub(crate) fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    /// Call `on_event` once and publish a non-empty result
    pub async fn dispatch(&self, event: Event) -> Result<Dispatched, LoopError> {
        let processor = Arc::clone(&self.processor);
        let mut handle = tokio::spawn(async move {
            let mut processor = processor.lock().await;
            processor.on_event(event).await
        });
        self.in_flight.set(Some(handle.abort_handle()));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    handle.abort();
                    self.in_flight.set(None);
                    return Err(LoopError::DispatchTimeout(limit));
                }
            },
            None => (&mut handle).await,
        };
        self.in_flight.set(None);

        match joined.map_err(LoopError::from_join)? {
            Some(result) if !result.is_null() => {
                self.produce.produce(&result).await;
                Ok(Dispatched::Produced)
            }
            _ => {
                debug!("on_event returned nothing; output suppressed");
                Ok(Dispatched::Suppressed)
            }
        }
    }

    /// Drain a staged queue until stopped.
    ///
    /// Events still buffered once `running` is cleared are dropped, not
    /// dispatched. A fatal dispatch error marks `status` Stopped and clears
    /// `running` so the consume task ends too.
    pub async fn run_staged(
        self,
        mut queue: QueueReceiver,
        running: Arc<AtomicBool>,
        status: LoopStatus,
        recheck: Duration,
    ) {
        loop {
            match queue.recv_timeout(recheck).await {
                Received::Event(event) => {
                    if !running.load(Ordering::Acquire) {
                        queue.complete();
                        let dropped = 1 + queue.discard();
                        info!(dropped, "stopping; buffered events dropped");
                        break;
                    }
                    let dispatched = self.dispatch(event).await;
                    queue.complete();
                    if let Err(e) = dispatched {
                        e.log();
                        if e.is_fatal() {
                            status.set(LoopState::Stopped);
                            running.store(false, Ordering::Release);
                            break;
                        }
                    }
                }
                Received::Idle => {
                    if !running.load(Ordering::Acquire) {
                        break;
                    }
                }
                Received::Closed => break,
            }
        }
        debug!("dispatch task finished");
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
