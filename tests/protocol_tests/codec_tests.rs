//! Codec Tests
//!
//! Tests for request and response framing.

use std::io::Cursor;

use itemkv::protocol::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, FrameKind, Request, Response, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use itemkv::ItemError;
use serde_json::json;

// =============================================================================
// Request Frames
// =============================================================================

#[test]
fn test_request_frame_layout() {
    let request = Request::post(r#"{"foo":"bar"}"#);
    let encoded = encode_request(&request).unwrap();

    assert_eq!(encoded[0], FrameKind::Request as u8);
    let len = u32::from_be_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]) as usize;
    assert_eq!(encoded.len(), HEADER_SIZE + len);

    let payload: serde_json::Value = serde_json::from_slice(&encoded[HEADER_SIZE..]).unwrap();
    assert_eq!(payload["httpMethod"], "POST");
    assert_eq!(payload["body"], r#"{"foo":"bar"}"#);
    assert!(payload.get("pathParameters").is_none());
}

#[test]
fn test_decode_request_accepts_dispatcher_shape() {
    let payload = json!({
        "httpMethod": "GET",
        "pathParameters": { "id": "abc" },
        "headers": { "ignored": "yes" }
    })
    .to_string();

    let mut frame = vec![FrameKind::Request as u8];
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload.as_bytes());

    let request = decode_request(&frame).unwrap();
    assert_eq!(request.http_method.as_deref(), Some("GET"));
    assert_eq!(request.path_id(), Some("abc"));
    assert!(request.body.is_none());
}

#[test]
fn test_decode_request_rejects_response_frame() {
    let encoded = encode_response(&Response::ok(&json!({}))).unwrap();
    assert!(matches!(decode_request(&encoded), Err(ItemError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_frames() {
    let encoded = encode_request(&Request::get("abc")).unwrap();

    assert!(matches!(decode_request(&encoded[..3]), Err(ItemError::Protocol(_))));
    assert!(matches!(
        decode_request(&encoded[..encoded.len() - 1]),
        Err(ItemError::Protocol(_))
    ));
}

#[test]
fn test_decode_unknown_kind() {
    let frame = [0x7f, 0, 0, 0, 0];
    assert!(matches!(decode_request(&frame), Err(ItemError::Protocol(_))));
}

#[test]
fn test_decode_oversized_length() {
    let mut frame = vec![FrameKind::Request as u8];
    frame.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());
    assert!(matches!(decode_request(&frame), Err(ItemError::Protocol(_))));
}

#[test]
fn test_decode_non_json_payload() {
    let mut frame = vec![FrameKind::Request as u8];
    frame.extend_from_slice(&4u32.to_be_bytes());
    frame.extend_from_slice(b"oops");
    assert!(matches!(decode_request(&frame), Err(ItemError::Protocol(_))));
}

// =============================================================================
// Response Frames
// =============================================================================

#[test]
fn test_response_envelope_field_names() {
    let encoded = encode_response(&Response::error(405, "method not allowed")).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&encoded[HEADER_SIZE..]).unwrap();

    assert_eq!(payload["statusCode"], 405);
    assert_eq!(payload["headers"]["Content-Type"], "application/json");
    assert_eq!(payload["body"], r#"{"error":"method not allowed"}"#);

    let decoded = decode_response(&encoded).unwrap();
    assert_eq!(decoded.status_code, 405);
}

// =============================================================================
// Stream Helpers
// =============================================================================

#[test]
fn test_stream_multiple_requests() {
    let mut buffer = Vec::new();
    write_request(&mut buffer, &Request::post("{}")).unwrap();
    write_request(&mut buffer, &Request::get("abc")).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_request(&mut cursor).unwrap(), Request::post("{}"));
    assert_eq!(read_request(&mut cursor).unwrap(), Request::get("abc"));

    let eof = read_request(&mut cursor).unwrap_err();
    match eof {
        ItemError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected EOF, got {:?}", other),
    }
}

#[test]
fn test_stream_response() {
    let mut buffer = Vec::new();
    let response = Response::ok(&json!({ "id": "abc", "status": "created" }));
    write_response(&mut buffer, &response).unwrap();

    let decoded = read_response(&mut Cursor::new(buffer)).unwrap();
    assert_eq!(decoded, response);
}
