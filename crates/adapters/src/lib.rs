// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! apmas-adapters: external collaborator traits (spec §6) — Spawner,
//! NotificationService, DashboardPublisher — plus in-process fakes.
//!
//! None of these have a production implementation in this workspace: the
//! real child-process launcher, paging integration, and web dashboard are
//! separate systems the supervisor only calls into.

pub mod dashboard;
pub mod notify;
pub mod spawner;

pub use dashboard::{DashboardEvent, DashboardEventKind, DashboardPublisher, NoopDashboardPublisher};
pub use notify::{EscalationNotification, NoopNotificationService, NotificationService};
pub use spawner::{NoopSpawner, SpawnResult, Spawner};

#[cfg(any(test, feature = "test-support"))]
pub use dashboard::FakeDashboardPublisher;
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotificationService;
#[cfg(any(test, feature = "test-support"))]
pub use spawner::{FakeSpawner, SpawnCall};
