//! HTTP/1.1 wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request.rs (incremental parser, headers.rs for field lines)
//!     → server.rs (hands the Request and a fresh writer to the handler)
//!     → response.rs (phase-enforced writer, chunked.rs for framing)
//!     → connection closes
//! ```
//!
//! # Design Decisions
//! - Built directly on the byte stream; no HTTP library underneath
//! - One request and one response per connection, always `Connection: close`
//! - Malformed input is rejected, never repaired

pub mod chunked;
pub mod error;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod typed;

pub use error::{ParseError, ParseResult, WriteError, WriteResult};
pub use headers::Headers;
pub use request::{ParserState, Request, RequestLine};
pub use response::{default_headers, ResponseWriter, StatusCode, WriterPhase};
pub use server::{Handler, HttpServer, ServerError};
pub use typed::{AwaitingStatus, BodyStage};

/// The HTTP line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// The only protocol version spoken, as it appears after `HTTP/`.
pub const HTTP_VERSION: &str = "1.1";
