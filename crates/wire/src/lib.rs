// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for the JSON-RPC tool/resource surface (spec §4.6).
//!
//! Wire format: LSP-style `Content-Length`/`Content-Type` framed headers
//! followed by a JSON-RPC 2.0 body.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod framing;
mod protocol;
mod resource;
mod tool;

pub use framing::{read_message, write_message, FramingError};
pub use protocol::{
    IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    JSONRPC_VERSION,
};
pub use resource::{ResourceContents, ResourceReadParams, ResourceReadResult};
pub use tool::{ToolCallParams, ToolContent, ToolResult};
