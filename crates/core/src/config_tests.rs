// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_match_spec_table() {
    let config = Config::default();
    assert_eq!(config.max_review_iterations, 3);
    assert_eq!(config.poll_interval, Duration::from_secs(2));
    assert_eq!(config.heartbeat_grace, Duration::from_secs(120));
}

#[test]
fn setters_chain_and_override_defaults() {
    let config = Config::default().max_retries(5).max_review_iterations(2).protocol_version("1.0");
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.max_review_iterations, 2);
    assert_eq!(config.protocol_version, "1.0");
}
