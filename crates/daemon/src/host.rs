// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-RPC Host: the stdio transport exposing tools and resources to agent
//! processes (spec §4.6).
//!
//! One spawned task per incoming request, fanned in through an `mpsc`
//! channel to a single writer task that owns the output handle. That writer
//! task is the transport-level lock of spec §5: concurrent request tasks
//! never interleave frames because only it ever calls `write_message`.

use crate::resources::ResourceRegistry;
use crate::tools::ToolRegistry;
use apmas_core::error::{RPC_INVALID_PARAMS, RPC_METHOD_NOT_FOUND, RPC_NOT_INITIALIZED};
use apmas_core::Clock;
use apmas_wire::{
    read_message, write_message, IncomingMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ResourceReadParams, ToolCallParams,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct JsonRpcHost<C: Clock> {
    tools: Arc<ToolRegistry<C>>,
    resources: Arc<ResourceRegistry<C>>,
    protocol_version: String,
    initialized: AtomicBool,
}

#[derive(Deserialize)]
struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
}

impl<C: Clock + Send + Sync + 'static> JsonRpcHost<C> {
    pub fn new(tools: Arc<ToolRegistry<C>>, resources: Arc<ResourceRegistry<C>>, protocol_version: impl Into<String>) -> Self {
        Self { tools, resources, protocol_version: protocol_version.into(), initialized: AtomicBool::new(false) }
    }

    /// Drives one connection to completion: reads frames until EOF or
    /// `shutdown` fires, then drains in-flight request tasks before the
    /// writer task is allowed to close.
    pub async fn run<R, W>(self: Arc<Self>, mut reader: R, writer: W, shutdown: CancellationToken)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(frame) = rx.recv().await {
                if let Err(err) = write_message(&mut writer, &frame).await {
                    tracing::error!(%err, "failed to write response frame");
                    break;
                }
            }
        });

        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                frame = read_message(&mut reader) => {
                    match frame {
                        Ok(Some(value)) => {
                            let host = self.clone();
                            let reply = tx.clone();
                            in_flight.spawn(async move { host.handle_frame(value, reply).await });
                        }
                        Ok(None) => break,
                        Err(err) => {
                            tracing::error!(%err, "framing error, closing connection");
                            break;
                        }
                    }
                }
            }
        }

        drop(tx);
        while in_flight.join_next().await.is_some() {}
        let _ = writer_task.await;
    }

    async fn handle_frame(&self, value: Value, reply: mpsc::UnboundedSender<Value>) {
        match IncomingMessage::from_value(value) {
            Ok(IncomingMessage::Request(request)) => {
                let response = self.handle_request(request).await;
                if let Ok(frame) = serde_json::to_value(&response) {
                    let _ = reply.send(frame);
                }
            }
            Ok(IncomingMessage::Notification(notification)) => self.handle_notification(notification),
            Err(err) => tracing::warn!(%err, "malformed frame, ignoring"),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.method != "initialize" && !self.initialized.load(Ordering::SeqCst) {
            return JsonRpcResponse::failure(request.id, RPC_NOT_INITIALIZED, "server has not been initialized", None);
        }

        let method = request.method.clone();
        match method.as_str() {
            "initialize" => self.handle_initialize(request),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            "resources/list" => self.handle_resources_list(request),
            "resources/read" => self.handle_resources_read(request),
            other => JsonRpcResponse::failure(request.id, RPC_METHOD_NOT_FOUND, format!("unknown method {other}"), None),
        }
    }

    fn handle_notification(&self, notification: JsonRpcNotification) {
        if notification.method == "notifications/initialized" {
            self.initialized.store(true, Ordering::SeqCst);
        } else {
            tracing::debug!(method = %notification.method, "unhandled notification");
        }
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: InitializeParams = match request.params.clone().and_then(|p| serde_json::from_value(p).ok()) {
            Some(p) => p,
            None => return JsonRpcResponse::failure(request.id, RPC_INVALID_PARAMS, "missing protocolVersion", None),
        };
        if params.protocol_version != self.protocol_version {
            return JsonRpcResponse::failure(
                request.id,
                RPC_INVALID_PARAMS,
                format!("unsupported protocolVersion {}, expected {}", params.protocol_version, self.protocol_version),
                None,
            );
        }
        JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "protocolVersion": self.protocol_version,
                "capabilities": {"tools": {}, "resources": {}},
            }),
        )
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .tools
            .list()
            .into_iter()
            .map(|d| serde_json::json!({"name": d.name, "description": d.description, "inputSchema": d.input_schema}))
            .collect();
        JsonRpcResponse::success(request.id, serde_json::json!({"tools": tools}))
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match request.params.clone().and_then(|p| serde_json::from_value(p).ok()) {
            Some(p) => p,
            None => return JsonRpcResponse::failure(request.id, RPC_INVALID_PARAMS, "missing tool call params", None),
        };
        match self.tools.call(&params.name, params.arguments).await {
            Ok(result) => JsonRpcResponse::success(request.id, serde_json::to_value(result).unwrap_or(Value::Null)),
            Err(err) if err.is_tool_error() => {
                let result = apmas_wire::ToolResult::error(err.to_string());
                JsonRpcResponse::success(request.id, serde_json::to_value(result).unwrap_or(Value::Null))
            }
            Err(err) => JsonRpcResponse::from_protocol_error(request.id, &err),
        }
    }

    fn handle_resources_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let resources: Vec<Value> = self
            .resources
            .list()
            .into_iter()
            .map(|d| serde_json::json!({"uri": d.uri, "name": d.name, "description": d.description}))
            .collect();
        JsonRpcResponse::success(request.id, serde_json::json!({"resources": resources}))
    }

    fn handle_resources_read(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let params: ResourceReadParams = match request.params.clone().and_then(|p| serde_json::from_value(p).ok()) {
            Some(p) => p,
            None => return JsonRpcResponse::failure(request.id, RPC_INVALID_PARAMS, "missing uri", None),
        };
        match self.resources.read(&params.uri) {
            Ok(result) => JsonRpcResponse::success(request.id, serde_json::to_value(result).unwrap_or(Value::Null)),
            Err(err) => JsonRpcResponse::failure(request.id, RPC_INVALID_PARAMS, err.to_string(), None),
        }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
