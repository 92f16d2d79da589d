// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Zstd-compressed point-in-time snapshot of [`crate::state::MaterializedState`].

use crate::state::MaterializedState;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Current on-disk schema version. Snapshots older than this are run
/// through [`crate::migration::MigrationRegistry`] before use.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Keep at most this many rotated `.bak` backups (teacher's corruption policy).
const MAX_BACKUPS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at_ms: u64,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zstd error: {0}")]
    Zstd(String),

    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, created_at_ms: u64) -> Self {
        Self { version: SNAPSHOT_SCHEMA_VERSION, seq, state, created_at_ms }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(&json[..], 0).map_err(|e| SnapshotError::Zstd(e.to_string()))?;

        if path.exists() {
            rotate_backups(path)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let mut compressed = Vec::new();
        std::fs::File::open(path)?.read_to_end(&mut compressed)?;
        let mut json = Vec::new();
        zstd::stream::copy_decode(&compressed[..], &mut json).map_err(|e| SnapshotError::Zstd(e.to_string()))?;
        let snapshot: Snapshot = serde_json::from_slice(&json)?;
        Ok(Some(snapshot))
    }
}

/// Rotates `path.bak` -> `path.bak.2` -> `path.bak.3`, discarding anything
/// beyond [`MAX_BACKUPS`], then copies `path` into `path.bak`.
fn rotate_backups(path: &Path) -> Result<(), SnapshotError> {
    let target = rotate_bak_path(path);
    std::fs::copy(path, target)?;
    Ok(())
}

/// Picks the next `.bak` / `.bak.N` path, rotating older backups out.
/// Keeps up to [`MAX_BACKUPS`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub fn rotate_bak_path(path: &Path) -> std::path::PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BACKUPS);
    if oldest.exists() {
        let _ = std::fs::remove_file(&oldest);
    }

    for n in (1..MAX_BACKUPS).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = std::fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
