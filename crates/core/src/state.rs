// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle state machines for processors and their consume loops.

use std::fmt;
use thiserror::Error;

/// Lifecycle of a processor instance. Stopped is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    Created,
    Running,
    Stopped,
}

/// Inputs driving [`ProcessorState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorEvent {
    /// `init()` was called
    Init,
    /// `stop()` was called
    Stop,
    /// The consume loop ended on an unrecoverable error
    LoopDied,
}

/// A lifecycle input that is not valid in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} to a {from} processor")]
pub struct TransitionError {
    pub from: ProcessorState,
    pub event: ProcessorEvent,
}

impl ProcessorState {
    /// Apply a lifecycle event.
    ///
    /// `Init` is only valid from Created. `Stop` and `LoopDied` always land
    /// in Stopped.
    pub fn transition(self, event: ProcessorEvent) -> Result<ProcessorState, TransitionError> {
        match (self, event) {
            (ProcessorState::Created, ProcessorEvent::Init) => Ok(ProcessorState::Running),
            (_, ProcessorEvent::Init) => Err(TransitionError { from: self, event }),
            (_, ProcessorEvent::Stop) | (_, ProcessorEvent::LoopDied) => {
                Ok(ProcessorState::Stopped)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ProcessorState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessorState::Stopped)
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorState::Created => write!(f, "created"),
            ProcessorState::Running => write!(f, "running"),
            ProcessorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Progress of the consume loop task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoopState {
    NotStarted = 0,
    Polling = 1,
    /// Running flag cleared; finishing the current iteration
    Draining = 2,
    Stopped = 3,
}

impl LoopState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`LoopState::as_u8`]; unknown values read as Stopped
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::NotStarted,
            1 => LoopState::Polling,
            2 => LoopState::Draining,
            _ => LoopState::Stopped,
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::NotStarted => write!(f, "not-started"),
            LoopState::Polling => write!(f, "polling"),
            LoopState::Draining => write!(f, "draining"),
            LoopState::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
