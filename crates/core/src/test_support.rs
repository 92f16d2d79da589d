// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test builders, gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::agent_state::{AgentState, AgentStatus};
use crate::checkpoint::Checkpoint;
use crate::ids::{CheckpointId, MessageId, ProjectId};
use crate::message::{AgentMessage, MessageType};
use crate::project::{ProjectPhase, ProjectState};
use crate::role::Role;
use std::path::PathBuf;

crate::builder! {
    pub struct AgentStateBuilder => AgentState {
        into {
            role: Role = "developer",
            subagent_type: String = "general-purpose"
        }
        set {
            status: AgentStatus = AgentStatus::Pending,
            retry_count: u32 = 0,
            review_iteration_count: u32 = 0,
            artifacts: Vec<String> = Vec::new(),
            dependencies: Vec<Role> = Vec::new()
        }
        option {
            spawned_at_ms: u64 = None,
            completed_at_ms: u64 = None,
            timeout_at_ms: u64 = None,
            last_heartbeat_ms: u64 = None,
            task_id: String = None,
            process_id: String = None,
            last_progress_message: String = None,
            last_error: String = None,
            estimated_context_usage: f64 = None,
            recovery_context: String = None
        }
    }
}

crate::builder! {
    pub struct AgentMessageBuilder => AgentMessage {
        into {
            from: Role = "developer",
            to: Role = "supervisor",
            content: String = "working"
        }
        set {
            timestamp_ms: u64 = 1_000,
            kind: MessageType = MessageType::Progress,
            artifacts: Vec<String> = Vec::new()
        }
        option { processed_at_ms: u64 = None }
        computed {
            id: MessageId = MessageId::new(),
            metadata: Option<std::collections::HashMap<String, serde_json::Value>> = None
        }
    }
}

crate::builder! {
    pub struct ProjectStateBuilder => ProjectState {
        into { name: String = "demo-project" }
        set {
            working_directory: PathBuf = PathBuf::from("/tmp/demo-project"),
            phase: ProjectPhase = ProjectPhase::Initializing,
            started_at_ms: u64 = 1_000
        }
        option {
            completed_at_ms: u64 = None,
            brief: String = None
        }
        computed { id: ProjectId = ProjectId::new() }
    }
}

crate::builder! {
    pub struct CheckpointBuilder => Checkpoint {
        into {
            role: Role = "developer",
            summary: String = "making progress"
        }
        set {
            created_at_ms: u64 = 1_000,
            completed_task_count: u32 = 1,
            total_task_count: u32 = 2,
            completed_items: Vec<String> = Vec::new(),
            pending_items: Vec<String> = Vec::new(),
            active_files: Vec<String> = Vec::new()
        }
        option {
            notes: String = None,
            estimated_context_usage: f64 = None
        }
        computed { id: CheckpointId = CheckpointId::new() }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod strategies {
    use crate::agent_state::AgentStatus;
    use crate::message::MessageType;
    use proptest::prelude::*;

    pub fn arb_agent_status() -> impl Strategy<Value = AgentStatus> {
        prop_oneof![
            Just(AgentStatus::Pending),
            Just(AgentStatus::Queued),
            Just(AgentStatus::Spawning),
            Just(AgentStatus::Running),
            Just(AgentStatus::Paused),
            Just(AgentStatus::Completed),
            Just(AgentStatus::Failed),
            Just(AgentStatus::TimedOut),
            Just(AgentStatus::Escalated),
        ]
    }

    pub fn arb_message_type() -> impl Strategy<Value = MessageType> {
        prop_oneof![
            Just(MessageType::Assignment),
            Just(MessageType::Progress),
            Just(MessageType::Question),
            Just(MessageType::Answer),
            Just(MessageType::Heartbeat),
            Just(MessageType::Checkpoint),
            Just(MessageType::Done),
            Just(MessageType::NeedsReview),
            Just(MessageType::Approved),
            Just(MessageType::ChangesRequested),
            Just(MessageType::Blocked),
            Just(MessageType::ContextLimit),
            Just(MessageType::Error),
            Just(MessageType::Info),
            Just(MessageType::Request),
        ]
    }
}

#[cfg(test)]
#[path = "test_support_tests.rs"]
mod tests;
