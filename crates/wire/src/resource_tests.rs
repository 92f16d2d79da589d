// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn json_helper_sets_mime_type() {
    let result = ResourceReadResult::json("apmas://project/state", "{}");
    assert_eq!(result.contents[0].mime_type, "application/json");
    assert_eq!(result.contents[0].uri, "apmas://project/state");
}

#[test]
fn read_params_round_trips() {
    let params = ResourceReadParams { uri: "apmas://agents/developer".to_string() };
    let value = serde_json::to_value(&params).unwrap();
    let back: ResourceReadParams = serde_json::from_value(value).unwrap();
    assert_eq!(back.uri, params.uri);
}
