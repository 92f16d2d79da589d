// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn agent_state_builder_applies_defaults_and_overrides() {
    let agent = AgentState::builder().role("reviewer").status(AgentStatus::Running).retry_count(2).build();
    assert_eq!(agent.role, Role::new("reviewer"));
    assert_eq!(agent.status, AgentStatus::Running);
    assert_eq!(agent.retry_count, 2);
    assert_eq!(agent.review_iteration_count, 0);
}

#[test]
fn agent_message_builder_applies_defaults_and_overrides() {
    let message = AgentMessage::builder().from("developer").to("supervisor").kind(MessageType::Done).build();
    assert_eq!(message.from, Role::new("developer"));
    assert_eq!(message.to, Role::new("supervisor"));
    assert_eq!(message.kind, MessageType::Done);
    assert!(!message.is_processed());
}

#[test]
fn project_state_builder_applies_defaults_and_overrides() {
    let project = ProjectState::builder().name("widget-factory").phase(ProjectPhase::Building).build();
    assert_eq!(project.name, "widget-factory");
    assert_eq!(project.phase, ProjectPhase::Building);
}

#[test]
fn checkpoint_builder_applies_defaults_and_overrides() {
    let checkpoint = Checkpoint::builder()
        .role("developer")
        .completed_task_count(3)
        .total_task_count(4)
        .build();
    assert_eq!(checkpoint.percent_complete(), 75);
}
