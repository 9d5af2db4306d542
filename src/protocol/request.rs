//! Request definitions
//!
//! The structured request delivered by the dispatcher.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An inbound request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Raw body, expected to be JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_parameters: Option<HashMap<String, String>>,
}

/// Request method as seen by the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }
}

impl Request {
    /// A POST carrying `body`
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            http_method: Some("POST".to_string()),
            path_parameters: None,
        }
    }

    /// A GET for the item `id`
    pub fn get(id: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("id".to_string(), id.into());
        Self {
            body: None,
            http_method: Some("GET".to_string()),
            path_parameters: Some(params),
        }
    }

    /// Parsed method, `None` when the request carries none
    pub fn method(&self) -> Option<Method> {
        self.http_method.as_deref().map(Method::parse)
    }

    /// The `id` path parameter
    pub fn path_id(&self) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get("id"))
            .map(String::as_str)
    }
}
