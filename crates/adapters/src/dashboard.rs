// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard event fan-out (spec §6, §7 "user-visible behavior"). The real
//! web dashboard is a separate system; the supervisor only publishes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardEventKind {
    AgentUpdate,
    Message,
    Checkpoint,
    ProjectUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardEvent {
    #[serde(rename = "type")]
    pub kind: DashboardEventKind,
    pub timestamp_ms: u64,
    pub data: serde_json::Value,
}

impl DashboardEvent {
    pub fn new(kind: DashboardEventKind, timestamp_ms: u64, data: serde_json::Value) -> Self {
        Self { kind, timestamp_ms, data }
    }
}

/// Fan-out sink for [`DashboardEvent`]s. Implementations forward to whatever
/// live-update channel the deployment wires up (websocket, SSE, ...).
pub trait DashboardPublisher: Send + Sync {
    fn publish(&self, event: DashboardEvent);
}

/// Discards every event. Used when no dashboard is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDashboardPublisher;

impl DashboardPublisher for NoopDashboardPublisher {
    fn publish(&self, _event: DashboardEvent) {}
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{DashboardEvent, DashboardPublisher};
    use parking_lot::Mutex;

    /// Records every published event in order, for assertions in tests.
    #[derive(Default)]
    pub struct FakeDashboardPublisher {
        events: Mutex<Vec<DashboardEvent>>,
    }

    impl FakeDashboardPublisher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<DashboardEvent> {
            self.events.lock().clone()
        }
    }

    impl DashboardPublisher for FakeDashboardPublisher {
        fn publish(&self, event: DashboardEvent) {
            self.events.lock().push(event);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDashboardPublisher;

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
