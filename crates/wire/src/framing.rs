// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LSP-style framing over stdio (spec §4.6): `Content-Length`/`Content-Type`
//! headers terminated by a blank line, followed by an exact-length body.

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing Content-Length header")]
    MissingContentLength,

    #[error("invalid Content-Length header: {0}")]
    InvalidContentLength(String),

    #[error("unsupported Content-Type: {0}")]
    UnsupportedContentType(String),

    #[error("malformed JSON body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Reads one framed message. Returns `Ok(None)` on a clean EOF before any
/// header bytes arrive (the normal way a stdio transport ends).
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Value>, FramingError>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut saw_any_header = false;

    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            if saw_any_header {
                return Err(FramingError::MissingContentLength);
            }
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        saw_any_header = true;

        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| FramingError::InvalidContentLength(value.trim().to_string()))?;
            content_length = Some(parsed);
        } else if let Some(value) = trimmed.strip_prefix("Content-Type:") {
            let kind = value.trim();
            if !kind.starts_with("application/json")
                && !kind.starts_with("application/apmas-jsonrpc")
                && !kind.starts_with("application/vscode-jsonrpc")
            {
                return Err(FramingError::UnsupportedContentType(kind.to_string()));
            }
        }
    }

    let length = content_length.ok_or(FramingError::MissingContentLength)?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    let value: Value = serde_json::from_slice(&body)?;
    Ok(Some(value))
}

/// Writes one framed message: headers, blank line, exact-length body, then flushes.
pub async fn write_message<W>(writer: &mut W, message: &Value) -> Result<(), FramingError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\nContent-Type: {}\r\n\r\n", body.len(), DEFAULT_CONTENT_TYPE);
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
