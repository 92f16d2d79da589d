// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional state store: snapshot + journal on disk, one materialized
//! copy in memory (spec §4.1).
//!
//! Writers take [`StateStore::write`]'s mutex, mutate the in-memory state,
//! append a [`JournalOp`] describing the change, then publish the new state
//! through an `arc-swap` so concurrent readers never block on a writer.

use crate::journal::{Journal, JournalError, JournalOp};
use crate::migration::MigrationRegistry;
use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use apmas_core::{AgentMessage, AgentState, Checkpoint, Clock, MessageId, ProjectState, Role, SystemClock};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Journal entries accumulated since the last snapshot before a new one is
/// forced, bounding replay time on recovery.
const SNAPSHOT_EVERY_N_ENTRIES: u64 = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("snapshot schema migration failed: {0}")]
    Migration(#[from] crate::migration::MigrationError),

    #[error("malformed snapshot during migration: {0}")]
    MalformedSnapshot(#[from] serde_json::Error),
}

pub struct StateStore {
    snapshot_path: PathBuf,
    journal: Mutex<Journal>,
    state: ArcSwap<MaterializedState>,
    last_snapshot_seq: Mutex<u64>,
}

impl StateStore {
    /// Opens the store at `data_directory`, migrating an old snapshot schema
    /// if needed, then replaying any journal entries past the snapshot's
    /// sequence number.
    pub fn open(data_directory: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_directory).map_err(JournalError::Io)?;
        let snapshot_path = data_directory.join("state.snapshot");
        let journal_path = data_directory.join("state.journal");

        let (mut state, snapshot_seq) = match Self::load_snapshot(&snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut journal = Journal::open(&journal_path, snapshot_seq)?;
        while let Some(entry) = journal.next_unprocessed()? {
            apply(&mut state, &entry.op);
            journal.mark_processed(entry.seq);
        }
        journal.flush()?;

        Ok(Self {
            snapshot_path,
            journal: Mutex::new(journal),
            state: ArcSwap::from_pointee(state),
            last_snapshot_seq: Mutex::new(snapshot_seq),
        })
    }

    fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, StoreError> {
        let Some(snapshot) = Snapshot::read_from(path)? else {
            return Ok(None);
        };
        if snapshot.version == crate::snapshot::SNAPSHOT_SCHEMA_VERSION {
            return Ok(Some(snapshot));
        }

        let value = serde_json::to_value(&snapshot)?;
        let migrated = MigrationRegistry::new()
            .migrate_to(value, crate::snapshot::SNAPSHOT_SCHEMA_VERSION)?;
        Ok(Some(serde_json::from_value(migrated)?))
    }

    /// Read-side view, lock-free: never blocks on an in-flight write.
    pub fn read(&self) -> Arc<MaterializedState> {
        self.state.load_full()
    }

    fn write(&self, op: JournalOp) -> Result<Arc<MaterializedState>, StoreError> {
        let mut journal = self.journal.lock();
        let seq = journal.append(&op)?;
        if journal.needs_flush() {
            journal.flush()?;
        }

        let mut state = (*self.state.load_full()).clone();
        apply(&mut state, &op);
        let state = Arc::new(state);
        self.state.store(state.clone());
        journal.mark_processed(seq);

        if seq.saturating_sub(*self.last_snapshot_seq.lock()) >= SNAPSHOT_EVERY_N_ENTRIES {
            self.snapshot_locked(&state, seq, &mut journal)?;
        }

        Ok(state)
    }

    fn snapshot_locked(
        &self,
        state: &MaterializedState,
        seq: u64,
        journal: &mut Journal,
    ) -> Result<(), StoreError> {
        let now_ms = SystemClock.epoch_ms();
        let snapshot = Snapshot::new(seq, state.clone(), now_ms);
        snapshot.write_to(&self.snapshot_path)?;
        journal.truncate_before(seq + 1)?;
        *self.last_snapshot_seq.lock() = seq;
        Ok(())
    }

    pub fn upsert_project(&self, project: ProjectState) -> Result<(), StoreError> {
        self.write(JournalOp::ProjectUpserted(project)).map(|_| ())
    }

    pub fn upsert_agent(&self, agent: AgentState) -> Result<(), StoreError> {
        self.write(JournalOp::AgentUpserted(agent)).map(|_| ())
    }

    pub fn append_message(&self, message: AgentMessage) -> Result<(), StoreError> {
        self.write(JournalOp::MessageAppended(message)).map(|_| ())
    }

    pub fn mark_message_processed(
        &self,
        id: MessageId,
        processed_at_ms: u64,
    ) -> Result<(), StoreError> {
        self.write(JournalOp::MessageProcessed { id, processed_at_ms }).map(|_| ())
    }

    pub fn append_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        self.write(JournalOp::CheckpointAppended(checkpoint)).map(|_| ())
    }

    pub fn project(&self) -> Option<ProjectState> {
        self.read().project.clone()
    }

    pub fn agent(&self, role: &Role) -> Option<AgentState> {
        self.read().agent(role).cloned()
    }

    pub fn unprocessed_messages_for(&self, role: &Role) -> Vec<AgentMessage> {
        self.read().unprocessed_for(role).into_iter().cloned().collect()
    }

    pub fn message(&self, id: &MessageId) -> Option<AgentMessage> {
        self.read().messages.iter().find(|m| m.id == *id).cloned()
    }

    pub fn checkpoint_history(&self, role: &Role) -> Vec<Checkpoint> {
        self.read().checkpoint_history(role).into_iter().cloned().collect()
    }

    pub fn latest_checkpoint(&self, role: &Role) -> Option<Checkpoint> {
        self.read().latest_checkpoint(role).cloned()
    }

    /// Records a clean shutdown in the journal so the next [`StateStore::open`]
    /// can distinguish it from a crash.
    pub fn shutdown(&self) -> Result<(), StoreError> {
        let mut journal = self.journal.lock();
        let seq = journal.append(&JournalOp::Shutdown)?;
        journal.mark_processed(seq);
        journal.flush()?;
        Ok(())
    }
}

fn apply(state: &mut MaterializedState, op: &JournalOp) {
    match op {
        JournalOp::ProjectUpserted(project) => state.project = Some(project.clone()),
        JournalOp::AgentUpserted(agent) => {
            state.agents.insert(agent.role.clone(), agent.clone());
        }
        JournalOp::MessageAppended(message) => state.messages.push(message.clone()),
        JournalOp::MessageProcessed { id, processed_at_ms } => {
            if let Some(message) = state.messages.iter_mut().find(|m| m.id == *id) {
                message.processed_at_ms = Some(*processed_at_ms);
            }
        }
        JournalOp::CheckpointAppended(checkpoint) => state.insert_checkpoint(checkpoint.clone()),
        JournalOp::Shutdown => {}
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
