//! Protocol Module
//!
//! Request/response envelopes and the framed wire protocol the dispatcher
//! speaks.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │       JSON Payload          │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Request payload
//! `{"httpMethod": "POST", "body": "{...}", "pathParameters": {"id": "..."}}`
//!
//! ### Response payload
//! `{"statusCode": 200, "headers": {...}, "body": "{...}"}`

mod request;
mod response;
mod codec;

pub use request::{Method, Request};
pub use response::{Response, CONTENT_TYPE};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, FrameKind, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
