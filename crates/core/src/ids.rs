// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generated entity identifiers, built on [`crate::define_id!`].

crate::define_id! {
    /// Unique identifier for an append-only [`crate::AgentMessage`].
    pub struct MessageId("msg-");
}

crate::define_id! {
    /// Unique identifier for a [`crate::Checkpoint`] snapshot.
    pub struct CheckpointId("ckp-");
}

crate::define_id! {
    /// Unique identifier for one supervisor process's project.
    pub struct ProjectId("prj-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
