// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tuning for a processor instance.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long a single consumer poll may block
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);
/// How long `stop()` waits for pending sends
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(30);
/// Producer poll performed once when the send buffer is full
pub const DEFAULT_BUFFER_FULL_BACKOFF: Duration = Duration::from_secs(1);
/// Extra wait, beyond one poll interval, for background tasks to finish on stop
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Timing and dispatch settings for the consume/produce loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeSettings {
    #[serde(with = "humantime_serde")]
    pub poll_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub flush_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub buffer_full_backoff: Duration,
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
    /// Deadline for a single `on_event` call. Unbounded when unset.
    #[serde(with = "humantime_serde")]
    pub dispatch_timeout: Option<Duration>,
    pub dispatch: DispatchMode,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            buffer_full_backoff: DEFAULT_BUFFER_FULL_BACKOFF,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            dispatch_timeout: None,
            dispatch: DispatchMode::Inline,
        }
    }
}

impl RuntimeSettings {
    /// Upper bound on how long `stop()` waits for background tasks
    pub fn join_timeout(&self) -> Duration {
        self.poll_timeout + self.shutdown_grace
    }
}

/// Where `on_event` runs relative to the poll loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DispatchMode {
    /// Dispatch synchronously from the consume task
    #[default]
    Inline,
    /// Hand events to a separate dispatch task over a bounded channel
    Staged { capacity: usize },
}
