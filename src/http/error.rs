//! Error definitions for the wire protocol layer.

use thiserror::Error;

use crate::http::request::ParserState;
use crate::http::response::WriterPhase;

/// Errors produced while turning a byte stream into a [`Request`](crate::http::Request).
///
/// Every variant aborts the connection that produced it. The parser never
/// patches malformed input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Request line did not split into exactly three space-separated fields.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// Method was empty or contained something other than uppercase ASCII letters.
    #[error("invalid method: {0:?}")]
    InvalidMethod(String),

    /// Version field was anything but `HTTP/1.1`.
    #[error("unsupported HTTP version: {0:?}")]
    UnsupportedVersion(String),

    /// Whitespace between the field name and the colon.
    #[error("whitespace before colon in field name: {0:?}")]
    SpaceInFieldName(String),

    /// Field name contained a character outside the token grammar.
    #[error("invalid header token: {0:?}")]
    InvalidHeaderToken(String),

    /// Header line had no colon at all.
    #[error("malformed field line: {0:?}")]
    MalformedFieldLine(String),

    /// `Content-Length` was not a non-negative integer.
    #[error("Content-Length is not a non-negative integer: {0:?}")]
    NonIntegerContentLength(String),

    /// More body bytes arrived than `Content-Length` declared.
    #[error("body exceeds Content-Length: expected {expected} bytes, received {received}")]
    ExcessBodyData { expected: usize, received: usize },

    /// The transport reached end-of-stream before the request was complete.
    #[error("incomplete request: end of stream while {state}")]
    IncompleteRequest { state: ParserState },

    /// Bytes were fed to a request that already finished parsing.
    #[error("request is already complete")]
    RequestDone,

    /// Reading from the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ParseError {
    /// Short stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedRequestLine(_) => "malformed_request_line",
            ParseError::InvalidMethod(_) => "invalid_method",
            ParseError::UnsupportedVersion(_) => "unsupported_version",
            ParseError::SpaceInFieldName(_) => "space_in_field_name",
            ParseError::InvalidHeaderToken(_) => "invalid_header_token",
            ParseError::MalformedFieldLine(_) => "malformed_field_line",
            ParseError::NonIntegerContentLength(_) => "non_integer_content_length",
            ParseError::ExcessBodyData { .. } => "excess_body_data",
            ParseError::IncompleteRequest { .. } => "incomplete_request",
            ParseError::RequestDone => "request_done",
            ParseError::Transport(_) => "transport",
        }
    }
}

/// Result type for request parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced by the [`ResponseWriter`](crate::http::ResponseWriter).
///
/// Phase and framing violations are integration bugs in the handler; they
/// are reported to the caller and nothing reaches the peer.
#[derive(Debug, Error)]
pub enum WriteError {
    /// An operation was attempted outside of the phase it belongs to.
    #[error("out of order write: expected phase {expected}, writer is in {actual}")]
    OutOfOrderWrite {
        expected: WriterPhase,
        actual: WriterPhase,
    },

    /// A body operation did not match the framing declared in the headers.
    #[error("{operation} is not valid for a response framed with {declared}")]
    FramingMismatch {
        operation: &'static str,
        declared: &'static str,
    },

    /// Headers declared both `Content-Length` and chunked transfer-encoding.
    #[error("Content-Length and chunked Transfer-Encoding are mutually exclusive")]
    ConflictingFraming,

    /// The declared `Content-Length` could not be parsed.
    #[error("declared Content-Length is not a non-negative integer: {0:?}")]
    InvalidContentLength(String),

    /// The body handed to `write_body` differs from the declared length.
    #[error("body is {actual} bytes but Content-Length declared {declared}")]
    BodyLengthMismatch { declared: usize, actual: usize },

    /// A trailer field was not named by the `Trailer` response header.
    #[error("trailer field {0:?} was not declared in the Trailer header")]
    UndeclaredTrailer(String),

    /// Writing to the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

/// Result type for response writing.
pub type WriteResult<T> = Result<T, WriteError>;
