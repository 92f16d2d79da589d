// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the supervisor workspace.
//!
//! Kinds, not type names: every fallible operation in the supervisor
//! returns one of these variants so that callers at the JSON-RPC boundary
//! and the tool boundary can map them to the right wire representation
//! without inspecting error messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON-RPC error code for a protocol-level violation (not initialized).
pub const RPC_NOT_INITIALIZED: i64 = -32002;
/// JSON-RPC error code for an internal/unexpected failure.
pub const RPC_INTERNAL: i64 = -32603;
/// JSON-RPC error code for invalid params, unknown resource, or version mismatch.
pub const RPC_INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code for an unknown method.
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code for a malformed request.
pub const RPC_INVALID_REQUEST: i64 = -32600;

/// Error taxonomy for the supervisor control plane.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum SupervisorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("timeout error: {0}")]
    TimeoutError(String),

    #[error("retryable spawn error: {0}")]
    RetryableSpawnError(String),

    #[error("fatal spawn error: {0}")]
    FatalSpawnError(String),
}

impl SupervisorError {
    /// JSON-RPC error code this kind maps to when it surfaces as a protocol
    /// error rather than a tool result.
    pub fn rpc_code(&self) -> i64 {
        match self {
            SupervisorError::ConfigError(_) | SupervisorError::ProtocolError(_) => {
                RPC_INVALID_PARAMS
            }
            SupervisorError::TransportError(_) => RPC_INVALID_REQUEST,
            _ => RPC_INTERNAL,
        }
    }

    /// Whether this error belongs to the tool-result (`isError: true`)
    /// discipline of §7, as opposed to a JSON-RPC error envelope.
    ///
    /// Agents can act on these — they represent expected domain failures,
    /// not protocol or infrastructure breakage.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            SupervisorError::NotFound(_)
                | SupervisorError::InvalidState(_)
                | SupervisorError::ValidationError(_)
        )
    }

    /// Short machine-readable kind name, used in log fields and DashboardEvents.
    pub fn kind(&self) -> &'static str {
        match self {
            SupervisorError::NotFound(_) => "not_found",
            SupervisorError::InvalidState(_) => "invalid_state",
            SupervisorError::ConfigError(_) => "config_error",
            SupervisorError::StorageError(_) => "storage_error",
            SupervisorError::TransportError(_) => "transport_error",
            SupervisorError::ProtocolError(_) => "protocol_error",
            SupervisorError::ValidationError(_) => "validation_error",
            SupervisorError::TimeoutError(_) => "timeout_error",
            SupervisorError::RetryableSpawnError(_) => "retryable_spawn_error",
            SupervisorError::FatalSpawnError(_) => "fatal_spawn_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
