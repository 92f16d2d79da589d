// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use apmas_core::{AgentState, MessageType, ProjectState};
use tempfile::tempdir;

fn developer(role: &Role) -> AgentState {
    AgentState::new(role.clone(), "claude", vec![])
}

#[test]
fn open_on_empty_directory_starts_with_default_state() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    assert!(store.project().is_none());
}

#[test]
fn upsert_and_read_round_trips_through_arc_swap() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    let role = Role::new("developer");

    store.upsert_agent(developer(&role)).unwrap();

    let agent = store.agent(&role).unwrap();
    assert_eq!(agent.role, role);
}

#[test]
fn append_message_and_mark_processed() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    let developer_role = Role::new("developer");
    let message = AgentMessage::new(
        Role::new("supervisor"),
        developer_role.clone(),
        MessageType::Assignment,
        "start work",
        1,
    );
    let id = message.id.clone();

    store.append_message(message).unwrap();
    assert_eq!(store.unprocessed_messages_for(&developer_role).len(), 1);

    store.mark_message_processed(id, 2).unwrap();
    assert!(store.unprocessed_messages_for(&developer_role).is_empty());
}

#[test]
fn checkpoint_history_reflects_appends() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    let role = Role::new("developer");

    store.append_checkpoint(Checkpoint::builder().role(role.clone()).summary("first").build()).unwrap();
    store.append_checkpoint(Checkpoint::builder().role(role.clone()).summary("second").build()).unwrap();

    let latest = store.latest_checkpoint(&role).unwrap();
    assert_eq!(latest.summary, "second");
    assert_eq!(store.checkpoint_history(&role).len(), 2);
}

#[test]
fn reopen_after_shutdown_recovers_state_from_journal_without_snapshot() {
    let dir = tempdir().unwrap();
    let role = Role::new("developer");
    {
        let store = StateStore::open(dir.path()).unwrap();
        store.upsert_project(ProjectState::new("demo", dir.path().to_path_buf(), 1)).unwrap();
        store.upsert_agent(developer(&role)).unwrap();
        store.shutdown().unwrap();
    }

    let store = StateStore::open(dir.path()).unwrap();
    assert!(store.project().is_some());
    assert!(store.agent(&role).is_some());
}

#[test]
fn reopen_after_forced_snapshot_still_has_full_state() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    let role = Role::new("developer");

    for i in 0..520u64 {
        store
            .append_message(AgentMessage::new(
                Role::new("supervisor"),
                role.clone(),
                MessageType::Progress,
                format!("update {i}"),
                i,
            ))
            .unwrap();
    }

    assert!(dir.path().join("state.snapshot").exists());

    drop(store);
    let store = StateStore::open(dir.path()).unwrap();
    assert_eq!(store.unprocessed_messages_for(&role).len(), 520);
}
