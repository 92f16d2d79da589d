// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn fake_publisher_records_events_in_order() {
    let publisher = FakeDashboardPublisher::new();

    publisher.publish(DashboardEvent::new(DashboardEventKind::AgentUpdate, 1, json!({"role": "developer"})));
    publisher.publish(DashboardEvent::new(DashboardEventKind::Checkpoint, 2, json!({"role": "developer"})));

    let events = publisher.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, DashboardEventKind::AgentUpdate);
    assert_eq!(events[1].kind, DashboardEventKind::Checkpoint);
}

#[test]
fn noop_publisher_accepts_any_event() {
    let publisher = NoopDashboardPublisher;
    publisher.publish(DashboardEvent::new(DashboardEventKind::Message, 1, json!(null)));
}
