// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project-wide state: one row per supervisor process.

use crate::ids::ProjectId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Phase of the overall project, derived by the supervisor's terminal-phase
/// check (spec §4.4 step 6) from the aggregate of all agent statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    Initializing,
    Planning,
    Building,
    Testing,
    Reviewing,
    Completing,
    Completed,
    Failed,
    Paused,
}

crate::simple_display! {
    ProjectPhase {
        Initializing => "initializing",
        Planning => "planning",
        Building => "building",
        Testing => "testing",
        Reviewing => "reviewing",
        Completing => "completing",
        Completed => "completed",
        Failed => "failed",
        Paused => "paused",
    }
}

impl ProjectPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectPhase::Completed | ProjectPhase::Failed)
    }
}

/// Single-row project state, owned by the state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub id: ProjectId,
    pub name: String,
    pub working_directory: PathBuf,
    pub phase: ProjectPhase,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief: Option<String>,
}

impl ProjectState {
    pub fn new(name: impl Into<String>, working_directory: PathBuf, now_ms: u64) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            working_directory,
            phase: ProjectPhase::Initializing,
            started_at_ms: now_ms,
            completed_at_ms: None,
            brief: None,
        }
    }

    crate::setters! {
        option { brief: String }
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
