// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only inter-agent messages, routed by the Message Bus (spec §4.3).

use crate::ids::MessageId;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message type, see the enum in the data model (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Assignment,
    Progress,
    Question,
    Answer,
    Heartbeat,
    Checkpoint,
    Done,
    NeedsReview,
    Approved,
    ChangesRequested,
    Blocked,
    ContextLimit,
    Error,
    Info,
    Request,
}

crate::simple_display! {
    MessageType {
        Assignment => "assignment",
        Progress => "progress",
        Question => "question",
        Answer => "answer",
        Heartbeat => "heartbeat",
        Checkpoint => "checkpoint",
        Done => "done",
        NeedsReview => "needs_review",
        Approved => "approved",
        ChangesRequested => "changes_requested",
        Blocked => "blocked",
        ContextLimit => "context_limit",
        Error => "error",
        Info => "info",
        Request => "request",
    }
}

/// One append-only entry in the Message Bus log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: MessageId,
    pub timestamp_ms: u64,
    pub from: Role,
    /// A real role, or one of the reserved recipients ("supervisor" / "all").
    pub to: Role,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at_ms: Option<u64>,
}

impl AgentMessage {
    pub fn new(from: Role, to: Role, kind: MessageType, content: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: MessageId::new(),
            timestamp_ms: now_ms,
            from,
            to,
            kind,
            content: content.into(),
            artifacts: Vec::new(),
            metadata: None,
            processed_at_ms: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at_ms.is_some()
    }

    /// Invariant 4 of the data model: `processedAt` is null xor `> timestamp`.
    pub fn processed_after_timestamp(&self) -> bool {
        match self.processed_at_ms {
            None => true,
            Some(processed) => processed > self.timestamp_ms,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
