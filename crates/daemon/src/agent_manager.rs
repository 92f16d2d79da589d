// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent State Manager: the only path that mutates [`AgentState`] (spec §4.2).
//!
//! Wraps the State Store with a per-role lock table so read-modify-write of
//! one role is strictly serialized while different roles proceed in
//! parallel, plus a short-TTL read cache invalidated on every write.

use apmas_core::{AgentState, AgentStatus, Clock, Role, SupervisorError};
use apmas_storage::StateStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a cached read stays valid before falling through to the store.
const CACHE_TTL: Duration = Duration::from_secs(5);

struct CacheEntry {
    state: AgentState,
    cached_at: Instant,
}

/// Per-role lock handles, created lazily so the table itself is only ever
/// briefly held.
struct LockTable {
    locks: Mutex<HashMap<Role, Arc<Mutex<()>>>>,
}

impl LockTable {
    fn new() -> Self {
        Self { locks: Mutex::new(HashMap::new()) }
    }

    fn lock_for(&self, role: &Role) -> Arc<Mutex<()>> {
        let mut table = self.locks.lock();
        table.entry(role.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

pub struct AgentStateManager<C: Clock> {
    store: Arc<StateStore>,
    clock: C,
    locks: LockTable,
    cache: Mutex<HashMap<Role, CacheEntry>>,
}

/// Whether a transition is part of the sanctioned rework back-edge (spec
/// §4.4 step 4c), which is the only path allowed to revert a terminal
/// status to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Normal,
    Rework,
}

impl<C: Clock> AgentStateManager<C> {
    pub fn new(store: Arc<StateStore>, clock: C) -> Self {
        Self { store, clock, locks: LockTable::new(), cache: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, role: &Role) -> Result<AgentState, SupervisorError> {
        if let Some(entry) = self.cache.lock().get(role) {
            if self.clock.now().duration_since(entry.cached_at) < CACHE_TTL {
                return Ok(entry.state.clone());
            }
        }

        let state = self
            .store
            .agent(role)
            .ok_or_else(|| SupervisorError::NotFound(format!("agent role {role} not found")))?;
        self.cache.lock().insert(
            role.clone(),
            CacheEntry { state: state.clone(), cached_at: self.clock.now() },
        );
        Ok(state)
    }

    /// Loads, mutates, validates and persists `role`'s state, serialized
    /// against any other in-flight update to the same role.
    pub fn update(
        &self,
        role: &Role,
        kind: TransitionKind,
        mutate: impl FnOnce(&mut AgentState),
    ) -> Result<AgentState, SupervisorError> {
        let role_lock = self.locks.lock_for(role);
        let _guard = role_lock.lock();

        let before = self
            .store
            .agent(role)
            .ok_or_else(|| SupervisorError::NotFound(format!("agent role {role} not found")))?;
        let before_status = before.status;

        let mut after = before;
        mutate(&mut after);

        if kind == TransitionKind::Normal
            && before_status.is_terminal()
            && after.status == AgentStatus::Pending
        {
            return Err(SupervisorError::InvalidState(format!(
                "role {role} cannot revert from terminal status {before_status} to pending outside the rework protocol"
            )));
        }

        self.store
            .upsert_agent(after.clone())
            .map_err(|e| SupervisorError::StorageError(e.to_string()))?;

        self.cache.lock().remove(role);
        Ok(after)
    }

    pub fn is_completed(&self, role: &Role) -> bool {
        self.get(role).map(|a| a.status == AgentStatus::Completed).unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "agent_manager_tests.rs"]
mod tests;
