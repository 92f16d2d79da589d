// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! apmas-core: shared types for the multi-agent project supervisor.

pub mod macros;

pub mod agent_state;
pub mod checkpoint;
pub mod clock;
pub mod config;
pub mod error;
pub mod id;
pub mod ids;
pub mod message;
pub mod metrics;
pub mod project;
pub mod role;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent_state::{AgentState, AgentStatus, HeartbeatStatus};
pub use checkpoint::Checkpoint;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::Config;
pub use error::{Result, SupervisorError};
pub use id::short;
pub use ids::{CheckpointId, MessageId, ProjectId};
pub use message::{AgentMessage, MessageType};
pub use metrics::{noop_metrics, Metrics, NoopMetrics, SharedMetrics};
pub use project::{ProjectPhase, ProjectState};
pub use role::{Role, ALL, SUPERVISOR};
