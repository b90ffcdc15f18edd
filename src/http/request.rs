//! Incremental HTTP/1.1 request parser.
//!
//! # Responsibilities
//! - Consume partial reads into a growable buffer
//! - Recognize the request line, field lines and body boundaries
//! - Reject malformed input outright (no tolerant re-parsing)
//!
//! # States
//! ```text
//! Initialized → ParsingHeaders → ParsingBody → Done
//! ```
//! Transitions are forward-only. A request that reports `Done` has read
//! its full body.
//!
//! # Limitations
//! A request without `Content-Length` has an empty body whatever its
//! method. Chunked request bodies are not supported.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::error::{ParseError, ParseResult};
use crate::http::headers::{find_crlf, parse_content_length, Headers};
use crate::http::{CRLF, HTTP_VERSION};

/// Initial capacity of the read buffer. Doubles whenever it fills up.
pub const INITIAL_BUFFER_SIZE: usize = 8;

/// Where the parser currently is within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    Done,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParserState::Initialized => "awaiting request line",
            ParserState::ParsingHeaders => "parsing headers",
            ParserState::ParsingBody => "parsing body",
            ParserState::Done => "done",
        };
        f.write_str(name)
    }
}

/// The first line of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// One or more uppercase ASCII letters.
    pub method: String,
    /// Opaque request target, not validated as a URI.
    pub target: String,
    /// Always `"1.1"` once parsed.
    pub version: String,
}

impl FromStr for RequestLine {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split(' ').collect();
        let &[method, target, version] = parts.as_slice() else {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        };

        if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ParseError::InvalidMethod(method.to_string()));
        }

        if target.is_empty() {
            return Err(ParseError::MalformedRequestLine(line.to_string()));
        }

        match version.strip_prefix("HTTP/") {
            Some(HTTP_VERSION) => {}
            _ => return Err(ParseError::UnsupportedVersion(version.to_string())),
        }

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version: HTTP_VERSION.to_string(),
        })
    }
}

/// A request under construction, or a complete one once [`is_done`](Request::is_done).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    request_line: RequestLine,
    headers: Headers,
    body: Vec<u8>,
    state: ParserState,
}

impl Request {
    /// An empty request waiting for its request line.
    pub fn new() -> Self {
        Self {
            request_line: RequestLine::default(),
            headers: Headers::new(),
            body: Vec::new(),
            state: ParserState::Initialized,
        }
    }

    /// Read exactly one request from `reader`.
    pub async fn from_reader<R>(reader: &mut R) -> ParseResult<Self>
    where
        R: AsyncRead + Unpin,
    {
        Self::from_reader_with_capacity(reader, INITIAL_BUFFER_SIZE).await
    }

    /// Read exactly one request, starting with a buffer of `initial_capacity` bytes.
    pub async fn from_reader_with_capacity<R>(
        reader: &mut R,
        initial_capacity: usize,
    ) -> ParseResult<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = BytesMut::with_capacity(initial_capacity.max(1));
        let mut request = Self::new();

        while !request.is_done() {
            if buf.len() == buf.capacity() {
                let grow_by = buf.capacity().max(1);
                buf.reserve(grow_by);
            }

            let read = reader.read_buf(&mut buf).await?;
            if read == 0 {
                return Err(ParseError::IncompleteRequest {
                    state: request.state,
                });
            }

            let consumed = request.parse(&buf)?;
            buf.advance(consumed);

            tracing::trace!(
                bytes_read = read,
                bytes_consumed = consumed,
                buffered = buf.len(),
                capacity = buf.capacity(),
                state = %request.state,
                "Fed request parser"
            );
        }

        Ok(request)
    }

    /// Feed buffered bytes to the parser.
    ///
    /// Parses as many complete tokens as `data` holds and returns how many
    /// bytes were consumed. Unconsumed bytes must be presented again,
    /// followed by newly arrived data, on the next call.
    pub fn parse(&mut self, data: &[u8]) -> ParseResult<usize> {
        if self.state == ParserState::Done {
            return Err(ParseError::RequestDone);
        }

        let mut total = 0;
        while self.state != ParserState::Done {
            let consumed = self.parse_single(&data[total..])?;
            if consumed == 0 {
                break;
            }
            total += consumed;
        }
        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> ParseResult<usize> {
        match self.state {
            ParserState::Initialized => {
                let Some(idx) = find_crlf(data) else {
                    return Ok(0);
                };
                let line = std::str::from_utf8(&data[..idx]).map_err(|_| {
                    ParseError::MalformedRequestLine(
                        String::from_utf8_lossy(&data[..idx]).into_owned(),
                    )
                })?;
                self.request_line = line.parse()?;
                self.state = ParserState::ParsingHeaders;
                Ok(idx + CRLF.len())
            }
            ParserState::ParsingHeaders => {
                let (consumed, done) = self.headers.parse(data)?;
                if done {
                    self.state = ParserState::ParsingBody;
                }
                Ok(consumed)
            }
            ParserState::ParsingBody => {
                let Some(expected) = self.content_length()? else {
                    self.state = ParserState::Done;
                    return Ok(0);
                };

                let received = self.body.len() + data.len();
                if received > expected {
                    return Err(ParseError::ExcessBodyData { expected, received });
                }

                self.body.extend_from_slice(data);
                if self.body.len() == expected {
                    self.state = ParserState::Done;
                }
                Ok(data.len())
            }
            ParserState::Done => Err(ParseError::RequestDone),
        }
    }

    /// The declared `Content-Length`, if any.
    pub fn content_length(&self) -> ParseResult<Option<usize>> {
        let Some(raw) = self.headers.get("content-length") else {
            return Ok(None);
        };

        parse_content_length(raw)
            .map(Some)
            .ok_or_else(|| ParseError::NonIntegerContentLength(raw.to_string()))
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Request line:")?;
        writeln!(f, "- Method: {}", self.request_line.method)?;
        writeln!(f, "- Target: {}", self.request_line.target)?;
        writeln!(f, "- Version: {}", self.request_line.version)?;
        writeln!(f, "Headers:")?;
        for (name, value) in self.headers.iter() {
            writeln!(f, "- {}: {}", name, value)?;
        }
        writeln!(f, "Body:")?;
        write!(f, "{}", String::from_utf8_lossy(&self.body))
    }
}
