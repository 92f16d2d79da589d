// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-role agent state: the mutable-class variant (spec §9 open question),
//! owned exclusively by the Agent State Manager's per-role read-modify-write.

use crate::role::Role;
use serde::{Deserialize, Serialize};

/// Lifecycle status of one agent, see the state machine in spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Queued,
    Spawning,
    Running,
    Paused,
    Completed,
    Failed,
    TimedOut,
    Escalated,
}

crate::simple_display! {
    AgentStatus {
        Pending => "pending",
        Queued => "queued",
        Spawning => "spawning",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        TimedOut => "timed_out",
        Escalated => "escalated",
    }
}

impl AgentStatus {
    /// Terminal statuses may only be reverted to `Pending` by the rework
    /// protocol (invariant 2 of the data model).
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Failed | AgentStatus::Escalated)
    }
}

/// Status reported by a `heartbeat` tool call (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatStatus {
    Working,
    Thinking,
    Writing,
}

/// One agent's full tracked state, keyed by [`Role`] in the State Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub role: Role,
    pub status: AgentStatus,
    pub subagent_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawned_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub review_iteration_count: u32,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_progress_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_context_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_context: Option<String>,
}

impl AgentState {
    pub fn new(role: Role, subagent_type: impl Into<String>, dependencies: Vec<Role>) -> Self {
        Self {
            role,
            status: AgentStatus::Pending,
            subagent_type: subagent_type.into(),
            spawned_at_ms: None,
            completed_at_ms: None,
            timeout_at_ms: None,
            last_heartbeat_ms: None,
            task_id: None,
            process_id: None,
            retry_count: 0,
            review_iteration_count: 0,
            artifacts: Vec::new(),
            dependencies,
            last_progress_message: None,
            last_error: None,
            estimated_context_usage: None,
            recovery_context: None,
        }
    }

    /// Whether every role in `dependencies` is found `Completed` in `completed`.
    pub fn dependencies_satisfied<'a>(
        &self,
        is_completed: impl Fn(&Role) -> bool + 'a,
    ) -> bool {
        self.dependencies.iter().all(|dep| is_completed(dep))
    }
}

#[cfg(test)]
#[path = "agent_state_tests.rs"]
mod tests;
