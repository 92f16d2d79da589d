// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory materialized state, the single owned copy behind the store's
//! write lock (spec §4.1).

use apmas_core::{AgentMessage, AgentState, Checkpoint, ProjectState, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bound on how many checkpoints the `history` resource will ever report
/// (spec §4.8 supplemented resource).
pub const CHECKPOINT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub project: Option<ProjectState>,
    pub agents: HashMap<Role, AgentState>,
    pub messages: Vec<AgentMessage>,
    pub checkpoints: HashMap<Role, Vec<Checkpoint>>,
}

impl MaterializedState {
    pub fn agent(&self, role: &Role) -> Option<&AgentState> {
        self.agents.get(role)
    }

    pub fn is_role_completed(&self, role: &Role) -> bool {
        self.agents.get(role).map(|a| a.status == apmas_core::AgentStatus::Completed).unwrap_or(false)
    }

    pub fn insert_checkpoint(&mut self, checkpoint: Checkpoint) {
        let entries = self.checkpoints.entry(checkpoint.role.clone()).or_default();
        entries.push(checkpoint);
    }

    /// Most recent checkpoints for a role, newest first, bounded to
    /// [`CHECKPOINT_HISTORY_LIMIT`].
    pub fn checkpoint_history(&self, role: &Role) -> Vec<&Checkpoint> {
        let mut history: Vec<&Checkpoint> =
            self.checkpoints.get(role).map(|v| v.iter().collect()).unwrap_or_default();
        history.reverse();
        history.truncate(CHECKPOINT_HISTORY_LIMIT);
        history
    }

    pub fn latest_checkpoint(&self, role: &Role) -> Option<&Checkpoint> {
        self.checkpoints.get(role).and_then(|v| v.last())
    }

    /// Unprocessed messages addressed to `role`, or to the "all" recipient.
    pub fn unprocessed_for(&self, role: &Role) -> Vec<&AgentMessage> {
        self.messages
            .iter()
            .filter(|m| !m.is_processed() && (m.to == *role || m.to == apmas_core::role::ALL))
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
