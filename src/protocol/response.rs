//! Response definitions
//!
//! The response envelope handed back to the dispatcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const CONTENT_TYPE: &str = "application/json";

/// A response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP-equivalent status code
    pub status_code: u16,

    pub headers: BTreeMap<String, String>,

    /// JSON-serialized body
    pub body: String,
}

impl Response {
    /// Response with `body` serialized as JSON and the standard headers
    pub fn json(status_code: u16, body: &Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), CONTENT_TYPE.to_string());
        headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());

        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    /// 200 with `body`
    pub fn ok(body: &Value) -> Self {
        Self::json(200, body)
    }

    /// Error response with body `{"error": message}`
    pub fn error(status_code: u16, message: &str) -> Self {
        Self::json(status_code, &json!({ "error": message }))
    }

    /// Parse the body back into JSON
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
