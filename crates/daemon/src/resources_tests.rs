// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use apmas_core::{AgentMessage, AgentState, Checkpoint, FakeClock, MessageType, ProjectState};
use tempfile::tempdir;

fn registry() -> (ResourceRegistry<FakeClock>, Arc<StateStore>, FakeClock) {
    let dir = tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let clock = FakeClock::new();
    let checkpoints = Arc::new(CheckpointService::new(store.clone()));
    (ResourceRegistry::new(store.clone(), checkpoints, clock.clone()), store, clock)
}

#[test]
fn list_enumerates_project_and_per_role_resources() {
    let (registry, store, _clock) = registry();
    store.upsert_agent(AgentState::new(Role::new("developer"), "general-purpose", vec![])).unwrap();

    let uris: Vec<String> = registry.list().into_iter().map(|d| d.uri).collect();
    assert!(uris.contains(&"apmas://project/state".to_string()));
    assert!(uris.contains(&"apmas://messages".to_string()));
    assert!(uris.contains(&"apmas://messages/developer".to_string()));
    assert!(uris.contains(&"apmas://checkpoints/developer".to_string()));
    assert!(uris.contains(&"apmas://checkpoints/developer/history".to_string()));
}

#[test]
fn reads_project_state_as_json() {
    let (registry, store, clock) = registry();
    store.upsert_project(ProjectState::new("demo", std::env::temp_dir(), clock.epoch_ms())).unwrap();

    let result = registry.read("apmas://project/state").unwrap();
    assert!(result.contents[0].text.contains("\"demo\""));
}

#[test]
fn reads_messages_for_one_role_newest_first() {
    let (registry, store, clock) = registry();
    store
        .append_message(AgentMessage::new(Role::new("supervisor"), Role::new("developer"), MessageType::Info, "first", 1))
        .unwrap();
    store
        .append_message(AgentMessage::new(Role::new("supervisor"), Role::new("developer"), MessageType::Info, "second", 2))
        .unwrap();
    let _ = clock;

    let result = registry.read("apmas://messages/developer").unwrap();
    let first_idx = result.contents[0].text.find("first").unwrap();
    let second_idx = result.contents[0].text.find("second").unwrap();
    assert!(second_idx < first_idx, "newest message should be serialized first");
}

#[test]
fn reads_latest_checkpoint_and_history() {
    let (registry, store, clock) = registry();
    store.upsert_agent(AgentState::new(Role::new("developer"), "general-purpose", vec![])).unwrap();
    store
        .append_checkpoint(Checkpoint {
            id: apmas_core::CheckpointId::new(),
            role: Role::new("developer"),
            created_at_ms: clock.epoch_ms(),
            summary: "first pass".to_string(),
            completed_task_count: 1,
            total_task_count: 4,
            completed_items: vec![],
            pending_items: vec![],
            active_files: vec![],
            notes: None,
            estimated_context_usage: None,
        })
        .unwrap();

    let latest = registry.read("apmas://checkpoints/developer").unwrap();
    assert!(latest.contents[0].text.contains("first pass"));

    let history = registry.read("apmas://checkpoints/developer/history").unwrap();
    assert!(history.contents[0].text.contains("first pass"));
}

#[test]
fn unknown_uri_is_a_validation_error() {
    let (registry, _store, _clock) = registry();
    let err = registry.read("apmas://not-a-thing").unwrap_err();
    assert!(matches!(err, SupervisorError::ValidationError(_)));
}

#[test]
fn repeated_reads_within_the_ttl_return_the_cached_snapshot() {
    let (registry, store, _clock) = registry();
    store.upsert_project(ProjectState::new("first-name", std::env::temp_dir(), 1)).unwrap();

    let first = registry.read("apmas://project/state").unwrap();
    store.upsert_project(ProjectState::new("second-name", std::env::temp_dir(), 2)).unwrap();
    let second = registry.read("apmas://project/state").unwrap();

    assert_eq!(first.contents[0].text, second.contents[0].text);
    assert!(second.contents[0].text.contains("first-name"));
}
