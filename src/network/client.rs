//! Blocking client for the framed request protocol.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use serde_json::Value;

use crate::error::{ItemError, Result};
use crate::handler::IDEMPOTENCY_KEY_FIELD;
use crate::protocol::{read_response, write_request, Request, Response};

/// A connection to an ItemKV server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| ItemError::Network(e.to_string()))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send a request and wait for its response
    pub fn send(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)
    }

    /// POST `payload`, adding `idempotencyKey` when given
    pub fn create(&mut self, mut payload: Value, idempotency_key: Option<&str>) -> Result<Response> {
        if let (Some(key), Some(fields)) = (idempotency_key, payload.as_object_mut()) {
            fields.insert(IDEMPOTENCY_KEY_FIELD.to_string(), Value::String(key.to_string()));
        }
        self.send(&Request::post(payload.to_string()))
    }

    /// GET the item `id`
    pub fn get(&mut self, id: &str) -> Result<Response> {
        self.send(&Request::get(id))
    }
}
