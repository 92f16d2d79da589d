// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use apmas_core::{AgentState, FakeClock};
use tempfile::tempdir;

fn registry() -> (ToolRegistry<FakeClock>, Arc<StateStore>) {
    let dir = tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let clock = FakeClock::new();
    let agents = Arc::new(AgentStateManager::new(store.clone(), clock.clone()));
    let bus = Arc::new(MessageBus::new(store.clone(), clock.clone()));
    let checkpoints = Arc::new(CheckpointService::new(store.clone()));
    (ToolRegistry::new(store.clone(), agents, bus, checkpoints, clock, 120_000), store)
}

fn seed_running(store: &StateStore, role: &str, dependencies: Vec<Role>) {
    let mut agent = AgentState::new(Role::new(role), "general-purpose", dependencies);
    agent.status = AgentStatus::Running;
    store.upsert_agent(agent).unwrap();
}

#[tokio::test]
async fn list_includes_every_registered_tool_exactly_once() {
    let (registry, _store) = registry();
    let names: Vec<&str> = registry.list().iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["heartbeat", "checkpoint", "send-message", "complete", "pause", "resume", "list-agents"]);
}

#[tokio::test]
async fn heartbeat_updates_timeout_and_rejects_bad_status() {
    let (registry, store) = registry();
    seed_running(&store, "developer", vec![]);

    let result = registry
        .call("heartbeat", serde_json::json!({"agentRole": "developer", "status": "working", "progress": "on it"}))
        .await
        .unwrap();
    assert!(!result.is_error);
    let agent = store.agent(&Role::new("developer")).unwrap();
    assert!(agent.last_heartbeat_ms.is_some());
    assert_eq!(agent.last_progress_message.as_deref(), Some("on it"));

    let bad = registry.call("heartbeat", serde_json::json!({"agentRole": "developer", "status": "sleeping"})).await.unwrap();
    assert!(bad.is_error);
}

#[tokio::test]
async fn checkpoint_filters_empty_strings_and_reports_progress() {
    let (registry, store) = registry();
    seed_running(&store, "developer", vec![]);

    let result = registry
        .call(
            "checkpoint",
            serde_json::json!({
                "agentRole": "developer",
                "summary": "halfway there",
                "completedItems": ["a", "", "b"],
                "pendingItems": ["c", ""],
            }),
        )
        .await
        .unwrap();

    assert!(!result.is_error);
    assert_eq!(result.content[0].text, "2/3 (66%) complete");
    let checkpoint = store.latest_checkpoint(&Role::new("developer")).unwrap();
    assert_eq!(checkpoint.completed_items, vec!["a", "b"]);
}

#[tokio::test]
async fn send_message_rejects_changes_requested_without_dependency_edge() {
    let (registry, store) = registry();
    seed_running(&store, "developer", vec![]);
    seed_running(&store, "reviewer", vec![]);

    let result = registry
        .call(
            "send-message",
            serde_json::json!({"from": "reviewer", "to": "developer", "type": "changes_requested", "content": "fix it"}),
        )
        .await
        .unwrap();

    assert!(result.is_error);
    assert!(store.unprocessed_messages_for(&Role::new("developer")).is_empty());
}

#[tokio::test]
async fn send_message_allows_changes_requested_with_dependency_edge() {
    let (registry, store) = registry();
    seed_running(&store, "developer", vec![]);
    seed_running(&store, "reviewer", vec![Role::new("developer")]);

    let result = registry
        .call(
            "send-message",
            serde_json::json!({"from": "reviewer", "to": "developer", "type": "changes_requested", "content": "fix it"}),
        )
        .await
        .unwrap();

    assert!(!result.is_error);
    assert_eq!(store.unprocessed_messages_for(&Role::new("developer")).len(), 1);
}

#[tokio::test]
async fn complete_transitions_running_agent_and_rejects_otherwise() {
    let (registry, store) = registry();
    seed_running(&store, "developer", vec![]);

    let result = registry
        .call("complete", serde_json::json!({"agentRole": "developer", "summary": "done", "artifacts": ["out.rs"]}))
        .await
        .unwrap();
    assert!(!result.is_error);
    assert_eq!(store.agent(&Role::new("developer")).unwrap().status, AgentStatus::Completed);

    let second = registry.call("complete", serde_json::json!({"agentRole": "developer", "summary": "again"})).await.unwrap();
    assert!(second.is_error);
}

#[tokio::test]
async fn unknown_tool_name_is_a_validation_error() {
    let (registry, _store) = registry();
    let err = registry.call("does-not-exist", serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, SupervisorError::ValidationError(_)));
}

#[tokio::test]
async fn successful_calls_fan_out_to_the_dashboard_and_metrics() {
    use apmas_adapters::FakeDashboardPublisher;
    use apmas_core::metrics::test_support::RecordingMetrics;

    let dir = tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let clock = FakeClock::new();
    let agents = Arc::new(AgentStateManager::new(store.clone(), clock.clone()));
    let bus = Arc::new(MessageBus::new(store.clone(), clock.clone()));
    let checkpoints = Arc::new(CheckpointService::new(store.clone()));
    let dashboard = Arc::new(FakeDashboardPublisher::new());
    let metrics = Arc::new(RecordingMetrics::new());
    let registry = ToolRegistry::with_observability(
        store.clone(),
        agents,
        bus,
        checkpoints,
        clock,
        120_000,
        dashboard.clone(),
        metrics.clone(),
    );
    seed_running(&store, "developer", vec![]);

    let result = registry
        .call("heartbeat", serde_json::json!({"agentRole": "developer", "status": "working"}))
        .await
        .unwrap();
    assert!(!result.is_error);

    assert_eq!(metrics.counter_value("apmas.heartbeats"), 1);
    let events = dashboard.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, DashboardEventKind::AgentUpdate);
}
