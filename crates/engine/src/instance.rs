// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A hosted processor: its clients, its background tasks and its lifecycle.

use crate::clients::BrokerClientPair;
use crate::consume::{ConsumeLoop, EventSink, LoopStatus};
use crate::dispatch::{Dispatcher, InFlight};
use crate::error::ProcessorError;
use crate::processor::EventProcessor;
use crate::produce::ProducePath;
use crate::queue::{Backlog, EventQueue};
use evp_adapters::{Broker, BrokerConsumer, BrokerProducer};
use evp_core::{
    DispatchMode, IdGen, LoopState, ProcessorConfig, ProcessorEvent, ProcessorState, UuidIdGen,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

/// Name of the task running the consume loop
pub const CONSUME_TASK: &str = "consume";
/// Name of the staged dispatch task
pub const DISPATCH_TASK: &str = "dispatch";

/// One running (or runnable) processor.
///
/// Built by [`construct`](Self::construct), started by
/// [`init`](Self::init), and torn down by [`stop`](Self::stop). The
/// instance exclusively owns its broker clients and background tasks.
pub struct ProcessorInstance<P: EventProcessor, B: Broker> {
    config: ProcessorConfig,
    processor: Arc<tokio::sync::Mutex<P>>,
    clients: BrokerClientPair<B>,
    state: ProcessorState,
    running: Arc<AtomicBool>,
    status: LoopStatus,
    tasks: BTreeMap<&'static str, JoinHandle<()>>,
    in_flight: InFlight,
    backlog: Backlog,
    detached: bool,
}

impl<P: EventProcessor, B: Broker> ProcessorInstance<P, B> {
    /// Open the broker clients and run `on_invocation`.
    ///
    /// Fails if the configuration is invalid or either client cannot be
    /// opened. Nothing is retried.
    pub async fn construct(
        config: ProcessorConfig,
        broker: &B,
        processor: P,
    ) -> Result<Self, ProcessorError> {
        Self::construct_with_ids(config, broker, processor, &UuidIdGen).await
    }

    /// Like [`construct`](Self::construct), drawing the consumer group
    /// suffix from `id_gen`
    pub async fn construct_with_ids(
        config: ProcessorConfig,
        broker: &B,
        mut processor: P,
        id_gen: &impl IdGen,
    ) -> Result<Self, ProcessorError> {
        config.validate()?;
        let clients = BrokerClientPair::open(broker, &config, id_gen).await?;
        debug!(consumer = %clients.consumer_config, "consumer config");
        debug!(producer = %clients.producer_config, "producer config");

        processor.on_invocation(&config).await;
        info!(
            invocation_id = %config.invocation_id,
            input_topic = %config.input_topic,
            output_topic = %config.output_topic,
            group_id = clients.consumer_config.group_id().unwrap_or_default(),
            "processor constructed"
        );

        Ok(Self {
            config,
            processor: Arc::new(tokio::sync::Mutex::new(processor)),
            clients,
            state: ProcessorState::Created,
            running: Arc::new(AtomicBool::new(false)),
            status: LoopStatus::default(),
            tasks: BTreeMap::new(),
            in_flight: InFlight::default(),
            backlog: Backlog::default(),
            detached: false,
        })
    }

    /// Start consuming. Returns once the background tasks are spawned.
    pub fn init(&mut self) -> Result<(), ProcessorError> {
        self.state = self.state.transition(ProcessorEvent::Init)?;
        self.running.store(true, Ordering::Release);

        let runtime = &self.config.runtime;
        let produce = ProducePath::new(
            Arc::clone(&self.clients.producer),
            self.config.output_topic.clone(),
            runtime.buffer_full_backoff,
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.processor),
            produce,
            runtime.dispatch_timeout,
        );
        self.in_flight = dispatcher.in_flight();
        let span = info_span!("processor", invocation_id = %self.config.invocation_id);

        let sink = match runtime.dispatch {
            DispatchMode::Inline => EventSink::Inline(dispatcher),
            DispatchMode::Staged { capacity } => {
                let (tx, rx) = EventQueue::bounded(capacity, runtime.poll_timeout);
                self.backlog = tx.backlog();
                let task = dispatcher
                    .run_staged(
                        rx,
                        Arc::clone(&self.running),
                        self.status.clone(),
                        runtime.poll_timeout,
                    )
                    .instrument(span.clone());
                self.tasks.insert(DISPATCH_TASK, tokio::spawn(task));
                EventSink::Staged(tx)
            }
        };

        let consume = ConsumeLoop::new(
            Arc::clone(&self.clients.consumer),
            self.config.input_topic.clone(),
            sink,
            Arc::clone(&self.running),
            self.status.clone(),
            runtime.poll_timeout,
        );
        self.tasks
            .insert(CONSUME_TASK, tokio::spawn(consume.run().instrument(span)));

        info!(
            invocation_id = %self.config.invocation_id,
            tasks = self.tasks.len(),
            "processor started"
        );
        Ok(())
    }

    /// Background tasks by name
    pub fn active_tasks(&self) -> &BTreeMap<&'static str, JoinHandle<()>> {
        &self.tasks
    }

    /// Effective lifecycle state. A started instance whose loop has died
    /// reports Stopped.
    pub fn state(&self) -> ProcessorState {
        if self.state.is_running() && !self.running.load(Ordering::Acquire) {
            return self
                .state
                .transition(ProcessorEvent::LoopDied)
                .unwrap_or(ProcessorState::Stopped);
        }
        self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.status.get()
    }

    /// True when no handed-off event is waiting for or inside `on_event`.
    /// Inline dispatch has no backlog, so this is always true there.
    pub fn is_idle(&self) -> bool {
        self.backlog.is_empty()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn invocation_id(&self) -> &str {
        &self.config.invocation_id
    }

    /// Stop consuming, release the clients and run `on_detach`.
    ///
    /// Waits at most `poll_timeout + shutdown_grace` for the background
    /// tasks, then aborts them. Close and flush failures are logged. Calling
    /// this again does nothing.
    pub async fn stop(&mut self) {
        if self.detached {
            debug!(invocation_id = %self.config.invocation_id, "already stopped");
            return;
        }
        self.detached = true;
        self.running.store(false, Ordering::Release);
        self.state = self
            .state
            .transition(ProcessorEvent::Stop)
            .unwrap_or(ProcessorState::Stopped);

        let runtime = self.config.runtime.clone();
        let deadline = tokio::time::Instant::now() + runtime.join_timeout();
        for (name, handle) in self.tasks.iter_mut() {
            match tokio::time::timeout_at(deadline, &mut *handle).await {
                Ok(Ok(())) => debug!(task = *name, "task finished"),
                Ok(Err(e)) => warn!(task = *name, error = %e, "task ended abnormally"),
                Err(_) => {
                    warn!(task = *name, "task did not finish in time; aborting");
                    self.in_flight.abort();
                    handle.abort();
                }
            }
        }
        self.status.set(LoopState::Stopped);

        if let Err(e) = self.clients.consumer.close().await {
            warn!(error = %e, "failed to close consumer");
        }
        if let Err(e) = self.clients.producer.flush(runtime.flush_timeout).await {
            warn!(error = %e, "failed to flush producer");
        }

        match tokio::time::timeout(runtime.shutdown_grace, self.processor.lock()).await {
            Ok(mut processor) => processor.on_detach().await,
            Err(_) => warn!("processor still busy; on_detach skipped"),
        }
        info!(invocation_id = %self.config.invocation_id, "processor stopped");
    }
}

impl<P: EventProcessor, B: Broker> Drop for ProcessorInstance<P, B> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
