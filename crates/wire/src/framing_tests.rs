// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tokio::io::BufReader;

#[tokio::test]
async fn round_trips_through_a_buffer() {
    let mut out = Vec::new();
    let message = json!({"jsonrpc": "2.0", "id": 1, "method": "heartbeat"});
    write_message(&mut out, &message).await.unwrap();

    let mut reader = BufReader::new(&out[..]);
    let read_back = read_message(&mut reader).await.unwrap().unwrap();
    assert_eq!(read_back, message);
}

#[tokio::test]
async fn clean_eof_before_headers_returns_none() {
    let mut reader = BufReader::new(&b""[..]);
    let result = read_message(&mut reader).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn truncated_after_headers_is_an_error() {
    let frame = b"Content-Length: 10\r\n\r\n";
    let mut reader = BufReader::new(&frame[..]);
    let result = read_message(&mut reader).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn missing_content_length_is_an_error() {
    let frame = b"Content-Type: application/apmas-jsonrpc\r\n\r\n";
    let mut reader = BufReader::new(&frame[..]);
    let result = read_message(&mut reader).await;
    assert!(matches!(result, Err(FramingError::MissingContentLength)));
}

#[tokio::test]
async fn unsupported_content_type_is_rejected() {
    let frame = b"Content-Length: 2\r\nContent-Type: text/plain\r\n\r\n{}";
    let mut reader = BufReader::new(&frame[..]);
    let result = read_message(&mut reader).await;
    assert!(matches!(result, Err(FramingError::UnsupportedContentType(_))));
}

#[tokio::test]
async fn plain_application_json_content_type_is_accepted() {
    let body = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}";
    let frame = format!("Content-Length: {}\r\nContent-Type: application/json\r\n\r\n", body.len());
    let mut bytes = frame.into_bytes();
    bytes.extend_from_slice(body);
    let mut reader = BufReader::new(&bytes[..]);
    let result = read_message(&mut reader).await.unwrap().unwrap();
    assert_eq!(result["method"], json!("initialize"));
}

#[tokio::test]
async fn written_frames_declare_application_json() {
    let mut out = Vec::new();
    write_message(&mut out, &json!({"jsonrpc": "2.0", "method": "progress"})).await.unwrap();
    let header = String::from_utf8_lossy(&out);
    assert!(header.starts_with("Content-Length:"));
    assert!(header.contains("Content-Type: application/json"));
}

#[tokio::test]
async fn two_frames_back_to_back_both_parse() {
    let mut out = Vec::new();
    write_message(&mut out, &json!({"jsonrpc": "2.0", "method": "progress"})).await.unwrap();
    write_message(&mut out, &json!({"jsonrpc": "2.0", "method": "done"})).await.unwrap();

    let mut reader = BufReader::new(&out[..]);
    let first = read_message(&mut reader).await.unwrap().unwrap();
    let second = read_message(&mut reader).await.unwrap().unwrap();
    assert_eq!(first["method"], json!("progress"));
    assert_eq!(second["method"], json!("done"));
}
