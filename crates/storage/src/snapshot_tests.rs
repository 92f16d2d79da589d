// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use apmas_core::{AgentState, Role};
use tempfile::tempdir;

fn sample_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    let role = Role::new("developer");
    state.agents.insert(role.clone(), AgentState::new(role, "claude", vec![]));
    state
}

#[test]
fn read_from_missing_path_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.snapshot");
    assert!(Snapshot::read_from(&path).unwrap().is_none());
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snapshot");
    let snapshot = Snapshot::new(42, sample_state(), 1_000);

    snapshot.write_to(&path).unwrap();
    let read_back = Snapshot::read_from(&path).unwrap().unwrap();

    assert_eq!(read_back.version, SNAPSHOT_SCHEMA_VERSION);
    assert_eq!(read_back.seq, 42);
    assert_eq!(read_back.created_at_ms, 1_000);
    assert!(read_back.state.agent(&Role::new("developer")).is_some());
}

#[test]
fn second_write_rotates_first_into_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snapshot");

    Snapshot::new(1, sample_state(), 1_000).write_to(&path).unwrap();
    Snapshot::new(2, sample_state(), 2_000).write_to(&path).unwrap();

    assert!(path.with_extension("bak").exists());
    let current = Snapshot::read_from(&path).unwrap().unwrap();
    assert_eq!(current.seq, 2);

    let backup = Snapshot::read_from(&path.with_extension("bak")).unwrap().unwrap();
    assert_eq!(backup.seq, 1);
}

#[test]
fn repeated_writes_rotate_through_bak_generations_and_evict_oldest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.snapshot");

    for seq in 1..=5u64 {
        Snapshot::new(seq, sample_state(), seq * 1_000).write_to(&path).unwrap();
    }

    let current = Snapshot::read_from(&path).unwrap().unwrap();
    assert_eq!(current.seq, 5);

    let bak1 = Snapshot::read_from(&path.with_extension("bak")).unwrap().unwrap();
    assert_eq!(bak1.seq, 4);

    let bak2 = Snapshot::read_from(&path.with_extension("bak.2")).unwrap().unwrap();
    assert_eq!(bak2.seq, 3);

    let bak3 = Snapshot::read_from(&path.with_extension("bak.3")).unwrap().unwrap();
    assert_eq!(bak3.seq, 2);

    assert!(!path.with_extension("bak.4").exists());
}
