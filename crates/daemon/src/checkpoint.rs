// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint/Recovery (spec §4.5): persists per-agent progress snapshots
//! and renders the resumption-context block consumed by the rework protocol.

use apmas_core::{Checkpoint, Role, SupervisorError};
use apmas_storage::StateStore;
use std::sync::Arc;

pub struct CheckpointService {
    store: Arc<StateStore>,
}

impl CheckpointService {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Persists `checkpoint`, stamping `role` onto it so a client-supplied
    /// mismatch can never attribute a checkpoint to the wrong agent.
    pub fn save(&self, role: &Role, mut checkpoint: Checkpoint) -> Result<Checkpoint, SupervisorError> {
        checkpoint.role = role.clone();
        self.store
            .append_checkpoint(checkpoint.clone())
            .map_err(|e| SupervisorError::StorageError(e.to_string()))?;
        Ok(checkpoint)
    }

    pub fn latest(&self, role: &Role) -> Option<Checkpoint> {
        self.store.latest_checkpoint(role)
    }

    /// Bounded history for the supplemented `apmas://checkpoints/{role}/history` resource.
    pub fn history(&self, role: &Role) -> Vec<Checkpoint> {
        self.store.checkpoint_history(role)
    }

    /// Resumption-context block for the rework protocol (spec §4.4 step 4c),
    /// or `None` if the role has never checkpointed.
    pub fn resumption_context(&self, role: &Role) -> Option<String> {
        self.latest(role).map(|c| c.resumption_context())
    }
}

#[cfg(test)]
#[path = "checkpoint_service_tests.rs"]
mod tests;
