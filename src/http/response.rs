//! Phase-enforced response writer.
//!
//! # Responsibilities
//! - Emit the status line, headers, body and trailers strictly in order
//! - Keep Content-Length and chunked framing mutually exclusive
//! - Refuse out-of-phase calls without touching the sink
//!
//! # Phases
//! ```text
//! StatusLine → Headers → Body ─────────────────────────────→ Done
//!                │         └─ chunks* → chunked done → Trailers → Done
//!                └─ no body framing declared ───────────────────→ Done
//! ```
//! All header customization happens on a [`Headers`] value before
//! [`ResponseWriter::write_headers`]; nothing can alter them afterwards.

use std::fmt;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::chunked::{self, LAST_CHUNK};
use crate::http::error::{WriteError, WriteResult};
use crate::http::headers::{parse_content_length, Headers};
use crate::http::typed::AwaitingStatus;
use crate::http::{CRLF, HTTP_VERSION};

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Reason phrase for the known codes; empty for everything else.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Position of a [`ResponseWriter`] within the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriterPhase {
    StatusLine,
    Headers,
    Body,
    Trailers,
    Done,
}

impl fmt::Display for WriterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriterPhase::StatusLine => "status-line",
            WriterPhase::Headers => "headers",
            WriterPhase::Body => "body",
            WriterPhase::Trailers => "trailers",
            WriterPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Body framing declared by the response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// Not known until headers are written.
    Undeclared,
    ContentLength(usize),
    Chunked,
    /// Neither Content-Length nor chunked; the response carries no body.
    Unframed,
}

impl Framing {
    fn from_headers(headers: &Headers) -> WriteResult<Self> {
        let chunked = chunked::is_chunked(headers);
        match (headers.get("content-length"), chunked) {
            (Some(_), true) => Err(WriteError::ConflictingFraming),
            (Some(raw), false) => parse_content_length(raw)
                .map(Framing::ContentLength)
                .ok_or_else(|| WriteError::InvalidContentLength(raw.to_string())),
            (None, true) => Ok(Framing::Chunked),
            (None, false) => Ok(Framing::Unframed),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Framing::Undeclared => "undeclared framing",
            Framing::ContentLength(_) => "Content-Length",
            Framing::Chunked => "chunked transfer-encoding",
            Framing::Unframed => "no body framing",
        }
    }
}

/// Headers every response starts from: `Content-Length`, `Connection: close`
/// and `Content-Type: text/plain`.
///
/// Adjust the returned value (override the content type, swap
/// Content-Length for chunked framing) before writing it.
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.set("Content-Length", &content_length.to_string());
    headers.set("Connection", "close");
    headers.set("Content-Type", "text/plain");
    headers
}

/// Writes a single response to `sink`, rejecting calls made out of order.
///
/// One writer per connection; it cannot be reused once [`WriterPhase::Done`].
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: W,
    phase: WriterPhase,
    framing: Framing,
    declared_trailers: Vec<String>,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            phase: WriterPhase::StatusLine,
            framing: Framing::Undeclared,
            declared_trailers: Vec::new(),
        }
    }

    pub fn phase(&self) -> WriterPhase {
        self.phase
    }

    /// Switch to the typestate API, where only the next legal call exists.
    ///
    /// Fails with `OutOfOrderWrite` if anything has already been written.
    pub fn staged(self) -> WriteResult<AwaitingStatus<W>> {
        self.expect_phase(WriterPhase::StatusLine)?;
        Ok(AwaitingStatus::from_writer(self))
    }

    /// Emit `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(&mut self, code: StatusCode) -> WriteResult<()> {
        self.expect_phase(WriterPhase::StatusLine)?;

        let line = format!(
            "HTTP/{} {} {}\r\n",
            HTTP_VERSION,
            code.as_u16(),
            code.reason_phrase()
        );
        self.emit(line.as_bytes()).await?;
        self.phase = WriterPhase::Headers;
        Ok(())
    }

    /// Emit every header line followed by the blank line ending the section.
    pub async fn write_headers(&mut self, headers: &Headers) -> WriteResult<()> {
        self.expect_phase(WriterPhase::Headers)?;
        let framing = Framing::from_headers(headers)?;

        let mut out = Vec::new();
        headers.encode_fields(&mut out);
        out.extend_from_slice(CRLF);
        self.emit(&out).await?;

        self.framing = framing;
        self.declared_trailers = chunked::declared_trailers(headers);
        self.phase = if framing == Framing::Unframed {
            WriterPhase::Done
        } else {
            WriterPhase::Body
        };
        Ok(())
    }

    /// Write the whole body of a Content-Length framed response.
    pub async fn write_body(&mut self, body: &[u8]) -> WriteResult<usize> {
        self.expect_phase(WriterPhase::Body)?;
        let Framing::ContentLength(declared) = self.framing else {
            return Err(self.framing_mismatch("write_body"));
        };
        if body.len() != declared {
            return Err(WriteError::BodyLengthMismatch {
                declared,
                actual: body.len(),
            });
        }

        self.emit(body).await?;
        self.phase = WriterPhase::Done;
        Ok(body.len())
    }

    /// Write one chunk of a chunked response. May be called repeatedly.
    ///
    /// An empty slice writes nothing, since a zero-length chunk would end
    /// the body.
    pub async fn write_chunked_body(&mut self, bytes: &[u8]) -> WriteResult<usize> {
        self.expect_chunked("write_chunked_body")?;

        let mut out = Vec::with_capacity(bytes.len() + 12);
        chunked::encode_chunk(bytes, &mut out);
        if !out.is_empty() {
            self.emit(&out).await?;
        }
        Ok(out.len())
    }

    /// Emit the terminating zero-length chunk.
    pub async fn write_chunked_body_done(&mut self) -> WriteResult<usize> {
        self.expect_chunked("write_chunked_body_done")?;

        self.emit(LAST_CHUNK).await?;
        self.phase = WriterPhase::Trailers;
        Ok(LAST_CHUNK.len())
    }

    /// Emit trailer fields and the final blank line.
    ///
    /// Each field must have been named by the `Trailer` header. An empty
    /// set just closes the message.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> WriteResult<()> {
        self.expect_phase(WriterPhase::Trailers)?;
        if let Some((name, _)) = trailers
            .iter()
            .find(|(name, _)| !self.declared_trailers.iter().any(|d| d.as_str() == *name))
        {
            return Err(WriteError::UndeclaredTrailer(name.to_string()));
        }

        let mut out = Vec::new();
        chunked::encode_trailers(trailers, &mut out);
        self.emit(&out).await?;
        self.phase = WriterPhase::Done;
        Ok(())
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn expect_phase(&self, expected: WriterPhase) -> WriteResult<()> {
        if self.phase != expected {
            return Err(WriteError::OutOfOrderWrite {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn expect_chunked(&self, operation: &'static str) -> WriteResult<()> {
        self.expect_phase(WriterPhase::Body)?;
        if self.framing != Framing::Chunked {
            return Err(self.framing_mismatch(operation));
        }
        Ok(())
    }

    fn framing_mismatch(&self, operation: &'static str) -> WriteError {
        WriteError::FramingMismatch {
            operation,
            declared: self.framing.name(),
        }
    }

    async fn emit(&mut self, bytes: &[u8]) -> WriteResult<()> {
        self.sink.write_all(bytes).await?;
        self.sink.flush().await?;
        Ok(())
    }
}
