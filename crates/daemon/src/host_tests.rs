// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::checkpoint::CheckpointService;
use crate::message_bus::MessageBus;
use apmas_core::error::{RPC_INVALID_PARAMS, RPC_METHOD_NOT_FOUND, RPC_NOT_INITIALIZED};
use apmas_core::FakeClock;
use apmas_storage::StateStore;
use apmas_wire::{JsonRpcNotification, JsonRpcRequest, RequestId};
use serde_json::json;
use tempfile::tempdir;
use tokio::io::{split, BufReader};

const PROTOCOL_VERSION: &str = "2024-11-05";

struct Harness {
    client_read: BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>,
    client_write: tokio::io::WriteHalf<tokio::io::DuplexStream>,
    shutdown: CancellationToken,
    server_task: tokio::task::JoinHandle<()>,
}

async fn spawn_host() -> Harness {
    let dir = tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let clock = FakeClock::new();
    let agents = Arc::new(crate::agent_manager::AgentStateManager::new(store.clone(), clock.clone()));
    let bus = Arc::new(MessageBus::new(store.clone(), clock.clone()));
    let checkpoints = Arc::new(CheckpointService::new(store.clone()));
    let tools = Arc::new(ToolRegistry::new(store.clone(), agents, bus, checkpoints.clone(), clock.clone(), 120_000));
    let resources = Arc::new(ResourceRegistry::new(store, checkpoints, clock));
    let host = Arc::new(JsonRpcHost::new(tools, resources, PROTOCOL_VERSION));

    let (client, server) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = split(client);
    let (server_read, server_write) = split(server);

    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move {
        host.run(BufReader::new(server_read), server_write, server_shutdown).await;
    });

    Harness { client_read: BufReader::new(client_read), client_write, shutdown, server_task }
}

async fn send_request(h: &mut Harness, id: i64, method: &str, params: Option<Value>) -> Value {
    let request = JsonRpcRequest::new(RequestId::Number(id), method, params);
    write_message(&mut h.client_write, &serde_json::to_value(&request).unwrap()).await.unwrap();
    read_message(&mut h.client_read).await.unwrap().unwrap()
}

async fn send_initialized_notification(h: &mut Harness) {
    let notification = JsonRpcNotification::new("notifications/initialized", None);
    write_message(&mut h.client_write, &serde_json::to_value(&notification).unwrap()).await.unwrap();
}

async fn initialize(h: &mut Harness) {
    let response = send_request(h, 0, "initialize", Some(json!({"protocolVersion": PROTOCOL_VERSION}))).await;
    assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    send_initialized_notification(h).await;
}

async fn close(h: Harness) {
    h.shutdown.cancel();
    drop(h.client_write);
    h.server_task.await.unwrap();
}

#[tokio::test]
async fn calls_before_initialize_are_rejected_except_initialize_itself() {
    let mut h = spawn_host().await;
    let response = send_request(&mut h, 1, "tools/list", None).await;
    assert_eq!(response["error"]["code"], RPC_NOT_INITIALIZED);
    close(h).await;
}

#[tokio::test]
async fn initialize_rejects_a_protocol_version_mismatch() {
    let mut h = spawn_host().await;
    let response = send_request(&mut h, 1, "initialize", Some(json!({"protocolVersion": "1999-01-01"}))).await;
    assert_eq!(response["error"]["code"], RPC_INVALID_PARAMS);
    close(h).await;
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let mut h = spawn_host().await;
    initialize(&mut h).await;
    let response = send_request(&mut h, 1, "does/not-exist", None).await;
    assert_eq!(response["error"]["code"], RPC_METHOD_NOT_FOUND);
    close(h).await;
}

#[tokio::test]
async fn tools_list_and_call_round_trip() {
    let mut h = spawn_host().await;
    initialize(&mut h).await;

    let list = send_request(&mut h, 1, "tools/list", None).await;
    let names: Vec<&str> = list["result"]["tools"].as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"heartbeat"));

    let call = send_request(
        &mut h,
        2,
        "tools/call",
        Some(json!({"name": "does-not-exist", "arguments": {}})),
    )
    .await;
    assert_eq!(call["result"]["isError"], true);
    close(h).await;
}

#[tokio::test]
async fn resources_list_and_read_round_trip() {
    let mut h = spawn_host().await;
    initialize(&mut h).await;

    let list = send_request(&mut h, 1, "resources/list", None).await;
    let uris: Vec<&str> = list["result"]["resources"].as_array().unwrap().iter().map(|r| r["uri"].as_str().unwrap()).collect();
    assert!(uris.contains(&"apmas://project/state"));

    let read = send_request(&mut h, 2, "resources/read", Some(json!({"uri": "apmas://project/state"}))).await;
    assert!(read["result"]["contents"][0]["text"].is_string());

    let bad = send_request(&mut h, 3, "resources/read", Some(json!({"uri": "apmas://nonsense"}))).await;
    assert_eq!(bad["error"]["code"], RPC_INVALID_PARAMS);
    close(h).await;
}
