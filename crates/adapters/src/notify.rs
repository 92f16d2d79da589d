// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Escalation notification sink (spec §4.4 step 5, §6). The real paging /
//! chat-ops integration is a separate system; the supervisor only calls in.

use apmas_core::Role;
use async_trait::async_trait;

/// Full context packet for one escalation, emitted once per status
/// transition into `Escalated` (re-emission is suppressed while the status
/// has not changed, per spec §4.4).
#[derive(Debug, Clone)]
pub struct EscalationNotification {
    pub role: Role,
    pub failure_count: u32,
    pub last_error: Option<String>,
    pub latest_checkpoint_summary: Option<String>,
    pub artifacts: Vec<String>,
    pub feedback_context: String,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(&self, notification: EscalationNotification);
}

/// Discards every notification. Used when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotificationService;

#[async_trait]
impl NotificationService for NoopNotificationService {
    async fn notify(&self, _notification: EscalationNotification) {}
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{EscalationNotification, NotificationService};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records every notification in memory for assertions in tests.
    #[derive(Default)]
    pub struct FakeNotificationService {
        notifications: Mutex<Vec<EscalationNotification>>,
    }

    impl FakeNotificationService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<EscalationNotification> {
            self.notifications.lock().clone()
        }
    }

    #[async_trait]
    impl NotificationService for FakeNotificationService {
        async fn notify(&self, notification: EscalationNotification) {
            self.notifications.lock().push(notification);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotificationService;

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
