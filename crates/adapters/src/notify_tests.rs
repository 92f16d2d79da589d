// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use apmas_core::Role;

fn sample_notification() -> EscalationNotification {
    EscalationNotification {
        role: Role::new("developer"),
        failure_count: 3,
        last_error: Some("build failed".to_string()),
        latest_checkpoint_summary: Some("halfway done".to_string()),
        artifacts: vec!["src/lib.rs".to_string()],
        feedback_context: "reviewer rejected twice".to_string(),
    }
}

#[tokio::test]
async fn fake_service_records_notifications() {
    let service = FakeNotificationService::new();
    service.notify(sample_notification()).await;

    let notifications = service.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].role, Role::new("developer"));
    assert_eq!(notifications[0].failure_count, 3);
}

#[tokio::test]
async fn noop_service_accepts_any_notification() {
    let service = NoopNotificationService;
    service.notify(sample_notification()).await;
}
