// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External agent spawner (spec §6): launching the actual subagent process
//! is a separate system. The supervisor only ever depends on this trait.

use apmas_core::Role;
use async_trait::async_trait;

/// Outcome of one spawn attempt.
#[derive(Debug, Clone)]
pub struct SpawnResult {
    pub success: bool,
    pub task_id: Option<String>,
    pub process_id: Option<String>,
    pub error_message: Option<String>,
}

impl SpawnResult {
    pub fn succeeded(task_id: impl Into<String>, process_id: impl Into<String>) -> Self {
        Self {
            success: true,
            task_id: Some(task_id.into()),
            process_id: Some(process_id.into()),
            error_message: None,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self { success: false, task_id: None, process_id: None, error_message: Some(error_message.into()) }
    }
}

#[async_trait]
pub trait Spawner: Send + Sync {
    async fn spawn(
        &self,
        role: &Role,
        subagent_type: &str,
        recovery_context: Option<&str>,
    ) -> SpawnResult;
}

/// Always fails. Used when no real child-process launcher is wired up; the
/// Supervisor Loop's retry/fail bookkeeping still runs correctly against it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSpawner;

#[async_trait]
impl Spawner for NoopSpawner {
    async fn spawn(&self, _role: &Role, _subagent_type: &str, _recovery_context: Option<&str>) -> SpawnResult {
        SpawnResult::failed("no spawner configured")
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{SpawnResult, Spawner};
    use apmas_core::Role;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Recorded spawn call, for asserting what the Supervisor Loop asked for.
    #[derive(Debug, Clone)]
    pub struct SpawnCall {
        pub role: Role,
        pub subagent_type: String,
        pub recovery_context: Option<String>,
    }

    /// Always returns a queued outcome (success by default), recording every
    /// call. Tests can push scripted results to drive retry/failure paths.
    #[derive(Default)]
    pub struct FakeSpawner {
        calls: Mutex<Vec<SpawnCall>>,
        scripted: Mutex<Vec<SpawnResult>>,
        next_id: AtomicU64,
    }

    impl FakeSpawner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a result to be returned by the next `spawn` call, FIFO. If
        /// the queue is empty, `spawn` succeeds with generated ids.
        pub fn push_result(&self, result: SpawnResult) {
            self.scripted.lock().push(result);
        }

        pub fn calls(&self) -> Vec<SpawnCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Spawner for FakeSpawner {
        async fn spawn(
            &self,
            role: &Role,
            subagent_type: &str,
            recovery_context: Option<&str>,
        ) -> SpawnResult {
            self.calls.lock().push(SpawnCall {
                role: role.clone(),
                subagent_type: subagent_type.to_string(),
                recovery_context: recovery_context.map(str::to_string),
            });

            let scripted = self.scripted.lock().pop();
            scripted.unwrap_or_else(|| {
                let n = self.next_id.fetch_add(1, Ordering::Relaxed);
                SpawnResult::succeeded(format!("task-{n}"), format!("proc-{n}"))
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSpawner, SpawnCall};

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
