//! HTTP/1.1 from raw TCP.
//!
//! An incremental request parser and a phase-enforced response writer,
//! built directly on a byte stream, plus a small connection server that
//! runs one request/response cycle per connection.
//!
//! ```text
//! TcpListener ──accept──▶ connection task
//!                             │ Request::from_reader (parser state machine)
//!                             ▼
//!                          handler(ResponseWriter, Request)
//!                             │ status line → headers → body | chunks → trailers
//!                             ▼
//!                          connection closed
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use http::{Headers, HttpServer, Request, ResponseWriter, StatusCode};
pub use lifecycle::Shutdown;
