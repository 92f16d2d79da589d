// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use apmas_core::{AgentState, FakeClock};
use std::time::Duration;
use tempfile::tempdir;

fn manager_with_agent(role: &Role) -> (AgentStateManager<FakeClock>, FakeClock) {
    let dir = tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    store.upsert_agent(AgentState::new(role.clone(), "claude", vec![])).unwrap();
    let clock = FakeClock::new();
    (AgentStateManager::new(store, clock.clone()), clock)
}

#[test]
fn get_missing_role_is_not_found() {
    let dir = tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let manager = AgentStateManager::new(store, FakeClock::new());

    let err = manager.get(&Role::new("developer")).unwrap_err();
    assert!(matches!(err, SupervisorError::NotFound(_)));
}

#[test]
fn update_persists_through_the_store() {
    let role = Role::new("developer");
    let (manager, _clock) = manager_with_agent(&role);

    manager
        .update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Queued)
        .unwrap();

    assert_eq!(manager.get(&role).unwrap().status, AgentStatus::Queued);
}

#[test]
fn normal_transition_cannot_revert_terminal_status_to_pending() {
    let role = Role::new("developer");
    let (manager, _clock) = manager_with_agent(&role);
    manager.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Completed).unwrap();

    let err = manager
        .update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Pending)
        .unwrap_err();

    assert!(matches!(err, SupervisorError::InvalidState(_)));
}

#[test]
fn rework_transition_may_revert_terminal_status_to_pending() {
    let role = Role::new("developer");
    let (manager, _clock) = manager_with_agent(&role);
    manager.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Completed).unwrap();

    let after = manager
        .update(&role, TransitionKind::Rework, |a| a.status = AgentStatus::Pending)
        .unwrap();

    assert_eq!(after.status, AgentStatus::Pending);
}

#[test]
fn cached_read_expires_after_ttl() {
    let role = Role::new("developer");
    let (manager, clock) = manager_with_agent(&role);

    manager.get(&role).unwrap();
    manager
        .store
        .upsert_agent(AgentState::new(role.clone(), "claude", vec![]))
        .unwrap();

    clock.advance(Duration::from_secs(1));
    // Still within TTL: update above bypassed the cache directly via the
    // store, but this path exists to document intended behavior once a
    // write goes through `update`, which always invalidates explicitly.
    manager.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Queued).unwrap();
    assert_eq!(manager.get(&role).unwrap().status, AgentStatus::Queued);

    clock.advance(Duration::from_secs(10));
    assert_eq!(manager.get(&role).unwrap().status, AgentStatus::Queued);
}

#[test]
fn is_completed_reflects_current_status() {
    let role = Role::new("developer");
    let (manager, _clock) = manager_with_agent(&role);
    assert!(!manager.is_completed(&role));

    manager.update(&role, TransitionKind::Normal, |a| a.status = AgentStatus::Completed).unwrap();
    assert!(manager.is_completed(&role));
}
