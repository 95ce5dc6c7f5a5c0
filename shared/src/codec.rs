//! Minimal HTTP/1.1 codec for the update endpoint
//!
//! Requests are framed as:
//! ```text
//! <METHOD> <target> HTTP/1.x\r\n
//! <header>: <value>\r\n ...
//! \r\n
//! [ Content-Length bytes of body ]
//! ```
//!
//! Bare `\n` line endings are accepted as well. Only what the endpoint needs
//! is supported: one request per connection, no chunked bodies, and the body
//! is consumed but never interpreted.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Maximum size of the request line plus headers (16 KB)
pub const MAX_HEADER_SIZE: usize = 16 * 1024;

/// Maximum accepted request body (1 MB)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Blank line ending the request head, with and without carriage returns
const HEAD_TERMINATORS: [&[u8]; 2] = [b"\r\n\r\n", b"\n\n"];

/// Errors that can occur while decoding a request
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Request headers too large (max: {MAX_HEADER_SIZE} bytes)")]
    HeadersTooLarge,

    #[error("Request body too large: {0} bytes (max: {MAX_BODY_SIZE})")]
    BodyTooLarge(usize),

    #[error("Malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("Malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("Invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,
}

/// A decoded HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Request path without the query string
    pub fn path(&self) -> &str {
        self.target
            .split_once('?')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    /// Look up a header value (case-insensitive name)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response status codes used by the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    RequestTimeout,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::RequestTimeout => 408,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::RequestTimeout => "Request Timeout",
        }
    }
}

/// A plain-text HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn text(status: Status, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Encode a response, always closing the connection afterwards
pub fn encode(response: &Response) -> Bytes {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status.code(),
        response.status.reason(),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let mut buf = BytesMut::with_capacity(head.len() + response.body.len());
    buf.put_slice(head.as_bytes());
    buf.put_slice(response.body.as_bytes());
    buf.freeze()
}

/// Try to decode a request from a buffer
///
/// Returns:
/// - `Ok(Some(request))` if a complete request (head and body) was decoded
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if the data is invalid
pub fn decode(buf: &mut BytesMut) -> Result<Option<Request>, CodecError> {
    let (head_len, terminator_len) = match find_head_end(buf) {
        Some(end) => end,
        None if buf.len() > MAX_HEADER_SIZE => return Err(CodecError::HeadersTooLarge),
        None => return Ok(None),
    };

    if head_len > MAX_HEADER_SIZE {
        return Err(CodecError::HeadersTooLarge);
    }

    let head = std::str::from_utf8(&buf[..head_len]).map_err(|_| CodecError::InvalidEncoding)?;
    let mut lines = head
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line));

    let request_line = lines.next().unwrap_or_default();
    let (method, target) = parse_request_line(request_line)?;

    let mut headers = Vec::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| CodecError::MalformedHeader(line.to_string()))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let request = Request {
        method,
        target,
        headers,
    };

    let content_length = match request.header("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| CodecError::InvalidContentLength(value.to_string()))?,
        None => 0,
    };

    if content_length > MAX_BODY_SIZE {
        return Err(CodecError::BodyTooLarge(content_length));
    }

    let total_len = head_len + terminator_len + content_length;
    if buf.len() < total_len {
        return Ok(None);
    }

    // The body is never interpreted
    buf.advance(total_len);

    Ok(Some(request))
}

/// Position and length of the earliest head terminator
fn find_head_end(buf: &[u8]) -> Option<(usize, usize)> {
    HEAD_TERMINATORS
        .iter()
        .filter_map(|terminator| {
            buf.windows(terminator.len())
                .position(|window| window == *terminator)
                .map(|pos| (pos, terminator.len()))
        })
        .min_by_key(|(pos, _)| *pos)
}

fn parse_request_line(line: &str) -> Result<(String, String), CodecError> {
    let malformed = || CodecError::MalformedRequestLine(line.to_string());

    let mut parts = line.split_whitespace();
    let method = parts.next().ok_or_else(malformed)?;
    let target = parts.next().ok_or_else(malformed)?;
    let version = parts.next().ok_or_else(malformed)?;

    if parts.next().is_some() || !version.starts_with("HTTP/1.") || !target.starts_with('/') {
        return Err(malformed());
    }

    Ok((method.to_string(), target.to_string()))
}

/// Streaming decoder accumulating bytes read from a connection
#[derive(Debug, Default)]
pub struct RequestDecoder {
    buffer: BytesMut,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next request from the buffer
    pub fn decode_next(&mut self) -> Result<Option<Request>, CodecError> {
        decode(&mut self.buffer)
    }

    /// Get the current buffer length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
