// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only journal of state mutations, replayed after the last snapshot
//! on startup (spec §4.1, "append-only journal" half of the snapshot+journal
//! pair).

use apmas_core::{AgentMessage, AgentState, Checkpoint, MessageId, ProjectState};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One durable state mutation. Control operations (`Shutdown`) carry no
/// state change but must still round-trip through the journal so a
/// recovering process can tell a clean shutdown from a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JournalOp {
    ProjectUpserted(ProjectState),
    AgentUpserted(AgentState),
    MessageAppended(AgentMessage),
    MessageProcessed { id: MessageId, processed_at_ms: u64 },
    CheckpointAppended(Checkpoint),
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalRecord {
    seq: u64,
    op: JournalOp,
}

#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub seq: u64,
    pub op: JournalOp,
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Number of buffered-but-unflushed appends that forces [`Journal::needs_flush`].
const FLUSH_THRESHOLD: usize = 100;
const MAX_BACKUPS: u32 = 3;

pub struct Journal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    read_offset: u64,
    pending_since_flush: usize,
}

impl Journal {
    /// Opens (creating if absent) the journal at `path`. `processed_seq` is
    /// the sequence number already durable in the last snapshot; entries at
    /// or below it are skipped by [`Journal::next_unprocessed`] and
    /// [`Journal::entries_after`].
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, JournalError> {
        if path.exists() {
            scrub_corruption(path)?;
        }

        let mut file = OpenOptions::new().create(true).read(true).append(true).open(path)?;
        let write_seq = last_seq_in_file(&mut file)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_seq,
            processed_seq,
            read_offset: 0,
            pending_since_flush: 0,
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_THRESHOLD
    }

    pub fn append(&mut self, op: &JournalOp) -> Result<u64, JournalError> {
        self.write_seq += 1;
        let record = JournalRecord { seq: self.write_seq, op: op.clone() };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.pending_since_flush += 1;
        Ok(self.write_seq)
    }

    pub fn flush(&mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        self.pending_since_flush = 0;
        Ok(())
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// Reads the next entry past both `processed_seq` and whatever has
    /// already been returned by this method. A record that fails to parse
    /// is skipped (the cursor moves past it) and this call returns `None`
    /// rather than erroring; a later append remains readable on the next call.
    pub fn next_unprocessed(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        let mut reader = self.reader_from(self.read_offset)?;
        loop {
            let mut line = String::new();
            let bytes = reader.read_line(&mut line)?;
            if bytes == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            let record: JournalRecord = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(_) => {
                    self.read_offset = reader.stream_position()?;
                    return Ok(None);
                }
            };
            self.read_offset = reader.stream_position()?;
            if record.seq > self.processed_seq {
                return Ok(Some(JournalEntry { seq: record.seq, op: record.op }));
            }
        }
    }

    /// All valid entries with `seq > after`, stopping at the first
    /// unparsable record.
    pub fn entries_after(&self, after: u64) -> Result<Vec<JournalEntry>, JournalError> {
        let mut reader = self.reader_from(0)?;
        let mut entries = Vec::new();
        loop {
            let mut line = String::new();
            let bytes = reader.read_line(&mut line)?;
            if bytes == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            let record: JournalRecord = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(_) => break,
            };
            if record.seq > after {
                entries.push(JournalEntry { seq: record.seq, op: record.op });
            }
        }
        Ok(entries)
    }

    /// Rewrites the journal keeping only entries with `seq >= keep_from`,
    /// used after a snapshot to bound journal growth.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), JournalError> {
        let kept = self.entries_after(keep_from.saturating_sub(1))?;
        let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        for entry in &kept {
            let record = JournalRecord { seq: entry.seq, op: entry.op.clone() };
            let mut line = serde_json::to_vec(&record)?;
            line.push(b'\n');
            file.write_all(&line)?;
        }
        file.flush()?;
        file.sync_all()?;
        self.file = OpenOptions::new().create(true).read(true).append(true).open(&self.path)?;
        self.read_offset = 0;
        Ok(())
    }

    fn reader_from(&self, offset: u64) -> Result<BufReader<File>, JournalError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        Ok(BufReader::new(file))
    }
}

fn last_seq_in_file(file: &mut File) -> Result<u64, JournalError> {
    file.seek(SeekFrom::Start(0))?;
    let reader = BufReader::new(&mut *file);
    let mut last = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<JournalRecord>(&line) {
            last = record.seq;
        }
    }
    file.seek(SeekFrom::End(0))?;
    Ok(last)
}

/// On open, walks the file and rotates it to `.bak` (keeping up to
/// [`MAX_BACKUPS`]) if any non-UTF-8 bytes or unparsable JSON lines are
/// found, rewriting the file with only the entries that parsed cleanly
/// before the first corruption.
fn scrub_corruption(path: &Path) -> Result<(), JournalError> {
    let bytes = std::fs::read(path)?;
    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(_) => {
            rotate_to_backup(path)?;
            std::fs::write(path, b"")?;
            return Ok(());
        }
    };

    let mut clean = String::new();
    let mut corrupted = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if serde_json::from_str::<JournalRecord>(line).is_ok() {
            clean.push_str(line);
            clean.push('\n');
        } else {
            corrupted = true;
            break;
        }
    }

    if corrupted {
        rotate_to_backup(path)?;
        std::fs::write(path, clean.as_bytes())?;
    }

    Ok(())
}

fn rotate_to_backup(path: &Path) -> Result<(), JournalError> {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BACKUPS);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for n in (1..MAX_BACKUPS).rev() {
        let src = bak(n);
        if src.exists() {
            std::fs::rename(&src, bak(n + 1))?;
        }
    }
    std::fs::copy(path, bak(1))?;
    Ok(())
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
