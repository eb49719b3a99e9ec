// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Host process for event processors (evpd)

pub mod config;
pub mod lifecycle;
pub mod processors;

pub use config::{BrokerKind, BrokerSettings, DaemonConfig};
pub use lifecycle::{startup, supervise, Daemon, ExitReason, LifecycleError};
pub use processors::register_builtin;
