// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent progress snapshots and resumption-context rendering (spec §4.5).

use crate::ids::CheckpointId;
use crate::role::Role;
use serde::{Deserialize, Serialize};

/// An append-only progress snapshot for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub role: Role,
    pub created_at_ms: u64,
    pub summary: String,
    pub completed_task_count: u32,
    pub total_task_count: u32,
    #[serde(default)]
    pub completed_items: Vec<String>,
    #[serde(default)]
    pub pending_items: Vec<String>,
    #[serde(default)]
    pub active_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_context_usage: Option<f64>,
}

impl Checkpoint {
    /// `percent-complete` is derived, never persisted directly.
    pub fn percent_complete(&self) -> u32 {
        if self.total_task_count == 0 {
            0
        } else {
            (100 * self.completed_task_count) / self.total_task_count
        }
    }

    /// Render the "N/M (p%) complete" summary returned by the `checkpoint` tool.
    pub fn progress_summary(&self) -> String {
        format!(
            "{}/{} ({}%) complete",
            self.completed_task_count,
            self.total_task_count,
            self.percent_complete()
        )
    }

    /// Render the human-readable resumption-context block (spec §4.5).
    ///
    /// Missing sections render as "None" / "No additional notes" rather than
    /// being omitted, so a downstream agent always sees a stable shape.
    pub fn resumption_context(&self) -> String {
        let bulleted = |items: &[String]| -> String {
            if items.is_empty() {
                "None".to_string()
            } else {
                items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n")
            }
        };

        let active_files = if self.active_files.is_empty() {
            "None".to_string()
        } else {
            format!("```\n{}\n```", self.active_files.join("\n"))
        };

        format!(
            "## Checkpoint for {role}\n\
             Last updated: {ts}\n\n\
             {summary}\n\n\
             Progress: {progress}\n\n\
             ### Completed\n{completed}\n\n\
             ### Pending\n{pending}\n\n\
             ### Active files\n{active_files}\n\n\
             ### Notes\n{notes}\n\n\
             Continue from this checkpoint.",
            role = self.role,
            ts = self.created_at_ms,
            summary = self.summary,
            progress = self.progress_summary(),
            completed = bulleted(&self.completed_items),
            pending = bulleted(&self.pending_items),
            active_files = active_files,
            notes = self.notes.as_deref().unwrap_or("No additional notes."),
        )
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
