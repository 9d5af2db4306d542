//! Request Handler
//!
//! Parses an inbound request, dispatches it to the repository and maps the
//! outcome onto a response envelope. Nothing escapes `handle`: client input
//! errors become 4xx, everything else becomes an opaque 500.

use serde_json::Value;

use crate::error::{ItemError, Result};
use crate::protocol::{Method, Request, Response};
use crate::repository::ItemRepository;

/// Body field naming the caller's idempotency key
pub const IDEMPOTENCY_KEY_FIELD: &str = "idempotencyKey";

/// Stateless request handler over a shared repository
pub struct RequestHandler {
    repository: ItemRepository,
}

impl RequestHandler {
    pub fn new(repository: ItemRepository) -> Self {
        Self { repository }
    }

    /// Handle one request
    pub fn handle(&self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(body) => Response::ok(&body),
            Err(e) if e.is_client_error() => {
                tracing::debug!("Rejected request: {}", e);
                Response::error(e.status_code(), e.public_message())
            }
            Err(e) => {
                tracing::error!(error = %e, method = ?request.http_method, "Request failed");
                Response::error(500, e.public_message())
            }
        }
    }

    /// Route by method.
    ///
    /// A body that is present must be JSON, whatever the method. GET reads by
    /// path id and does not need a body. Other explicit methods besides POST
    /// are refused. POST and method-less requests need a body; the latter
    /// then fall back to GET.
    fn dispatch(&self, request: &Request) -> Result<Value> {
        let body = parse_body(request.body.as_deref())?;

        match request.method() {
            Some(Method::Get) => self.get(request),
            Some(Method::Other(token)) => Err(ItemError::MethodNotAllowed(token)),
            Some(Method::Post) => self.create(body.ok_or(ItemError::MissingBody)?),
            None => {
                body.ok_or(ItemError::MissingBody)?;
                self.get(request)
            }
        }
    }

    fn create(&self, body: Value) -> Result<Value> {
        if !body.is_object() {
            return Err(ItemError::InvalidPayload("expected a JSON object".to_string()));
        }

        let key = body
            .get(IDEMPOTENCY_KEY_FIELD)
            .and_then(Value::as_str)
            .map(str::to_owned);

        let outcome = self.repository.create_item(body, key.as_deref())?;
        Ok(serde_json::to_value(outcome)?)
    }

    fn get(&self, request: &Request) -> Result<Value> {
        Ok(self.repository.get_item(request.path_id())?.into_body())
    }
}

/// Absent or empty bodies are `None`; anything else must parse
fn parse_body(raw: Option<&str>) -> Result<Option<Value>> {
    match raw {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text)
            .map(Some)
            .map_err(|e| ItemError::InvalidPayload(e.to_string())),
    }
}
