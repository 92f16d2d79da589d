// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot schema migration (spec §3: pre-existing on-disk snapshots whose
//! enum columns were persisted as integers get converted to the current
//! string-enum schema before the store is usable).

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MigrationError {
    #[error("snapshot version {0} is newer than the highest supported version {1}")]
    TooNew(u32, u32),

    #[error("no migration path from version {0} to {1}")]
    NoPath(u32, u32),
}

pub trait Migration {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError>;
}

/// Converts schema-version-0 snapshots (ordinal-integer enum columns, the
/// pre-`apmas` on-disk layout) into version 1 (stable snake_case strings).
struct OrdinalEnumsToStrings;

const AGENT_STATUS_TABLE: &[&str] =
    &["pending", "queued", "spawning", "running", "paused", "completed", "failed", "timed_out", "escalated"];

const PROJECT_PHASE_TABLE: &[&str] = &[
    "initializing",
    "planning",
    "building",
    "testing",
    "reviewing",
    "completing",
    "completed",
    "failed",
    "paused",
];

fn ordinal_to_string(value: &mut Value, table: &[&str]) {
    if let Some(n) = value.as_u64() {
        if let Some(name) = table.get(n as usize) {
            *value = Value::String((*name).to_string());
        }
    }
}

impl Migration for OrdinalEnumsToStrings {
    fn source_version(&self) -> u32 {
        0
    }

    fn target_version(&self) -> u32 {
        1
    }

    fn migrate(&self, snapshot: &mut Value) -> Result<(), MigrationError> {
        if let Some(phase) = snapshot.pointer_mut("/state/project/phase") {
            ordinal_to_string(phase, PROJECT_PHASE_TABLE);
        }
        if let Some(agents) = snapshot.pointer_mut("/state/agents").and_then(|v| v.as_object_mut()) {
            for agent in agents.values_mut() {
                if let Some(status) = agent.get_mut("status") {
                    ordinal_to_string(status, AGENT_STATUS_TABLE);
                }
            }
        }
        Ok(())
    }
}

pub struct MigrationRegistry {
    pub(crate) migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self { migrations: vec![Box::new(OrdinalEnumsToStrings)] }
    }

    /// Applies the chain of registered migrations needed to bring
    /// `snapshot["v"]` from its current value up to `target`.
    pub fn migrate_to(&self, mut snapshot: Value, target: u32) -> Result<Value, MigrationError> {
        let mut current = snapshot
            .get("v")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(target);

        if current > target {
            return Err(MigrationError::TooNew(current, target));
        }

        while current < target {
            let next = self.migrations.iter().find(|m| m.source_version() == current);
            let migration = next.ok_or(MigrationError::NoPath(current, target))?;
            migration.migrate(&mut snapshot)?;
            current = migration.target_version();
            snapshot["v"] = Value::from(current);
        }

        Ok(snapshot)
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
