// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hand-off channel between the consume task and a staged dispatch task.

use evp_core::Event;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};

/// Bounded event channel. A full channel makes the consume task wait,
/// which in turn stops it from polling.
pub struct EventQueue;

impl EventQueue {
    /// Create a channel holding at most `capacity` events. Waits on either
    /// side re-check the running flag every `recheck`.
    pub fn bounded(capacity: usize, recheck: Duration) -> (QueueSender, QueueReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let backlog = Backlog::default();
        (
            QueueSender {
                tx,
                recheck,
                backlog: backlog.clone(),
            },
            QueueReceiver { rx, backlog },
        )
    }
}

/// Events handed off but not yet finished by the dispatch task.
///
/// Counts both buffered events and the one being dispatched.
#[derive(Clone, Debug, Default)]
pub struct Backlog(Arc<AtomicUsize>);

impl Backlog {
    pub fn len(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    fn remove(&self, n: usize) {
        if n > 0 {
            self.0.fetch_sub(n, Ordering::AcqRel);
        }
    }
}

/// Result of handing an event to the dispatch task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    Sent,
    /// Stopped while waiting for space; the event was dropped
    Abandoned,
    /// The dispatch task is gone
    Closed,
}

pub struct QueueSender {
    tx: mpsc::Sender<Event>,
    recheck: Duration,
    backlog: Backlog,
}

impl QueueSender {
    pub fn backlog(&self) -> Backlog {
        self.backlog.clone()
    }

    /// Queue `event`, waiting for space while `running` stays set
    pub async fn send(&self, event: Event, running: &AtomicBool) -> Handoff {
        // Counted before the send so the receiver never sees it uncounted
        self.backlog.add();
        let handoff = self.try_send(event, running).await;
        if handoff != Handoff::Sent {
            self.backlog.remove(1);
        }
        handoff
    }

    async fn try_send(&self, event: Event, running: &AtomicBool) -> Handoff {
        let mut event = event;
        loop {
            if !running.load(Ordering::Acquire) {
                return Handoff::Abandoned;
            }
            match self.tx.send_timeout(event, self.recheck).await {
                Ok(()) => return Handoff::Sent,
                Err(SendTimeoutError::Timeout(returned)) => event = returned,
                Err(SendTimeoutError::Closed(_)) => return Handoff::Closed,
            }
        }
    }
}

/// What a bounded wait on the queue produced
#[derive(Debug)]
pub enum Received {
    Event(Event),
    Idle,
    Closed,
}

pub struct QueueReceiver {
    rx: mpsc::Receiver<Event>,
    backlog: Backlog,
}

impl QueueReceiver {
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Received {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(event)) => Received::Event(event),
            Ok(None) => Received::Closed,
            Err(_) => Received::Idle,
        }
    }

    /// Mark the last received event as finished, whatever its outcome
    pub fn complete(&self) {
        self.backlog.remove(1);
    }

    /// Discard everything still buffered, returning how many were dropped
    pub fn discard(&mut self) -> usize {
        self.rx.close();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        self.backlog.remove(dropped);
        dropped
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
