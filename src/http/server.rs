//! Connection server.
//!
//! # Responsibilities
//! - Bind the listening socket and run the accept loop in the background
//! - Serve exactly one request/response cycle per connection
//! - Isolate failures: a bad connection never stops the accept loop
//! - Close the listener on request while in-flight connections finish
//!
//! # Design Decisions
//! - One Tokio task per accepted connection, no shared state between them
//! - No keep-alive or pipelining: the connection closes once the handler returns
//! - No read/write deadlines while serving; only the drain after a 400 is bounded

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::{ListenerConfig, ServerConfig};
use crate::http::error::ParseError;
use crate::http::request::Request;
use crate::http::response::{default_headers, ResponseWriter, StatusCode};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;

/// Errors from the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to start listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("listener address unavailable: {0}")]
    LocalAddr(std::io::Error),

    #[error("accept loop terminated abnormally: {0}")]
    AcceptLoop(#[from] tokio::task::JoinError),
}

/// Callback invoked once per parsed request.
///
/// There is no error return: a handler reports failures by writing an
/// appropriate response through the writer before it returns. The
/// connection closes when the returned future completes.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, writer: ResponseWriter<TcpStream>, request: Request) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Handler for F
where
    F: Fn(ResponseWriter<TcpStream>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, writer: ResponseWriter<TcpStream>, request: Request) -> BoxFuture<'static, ()> {
        Box::pin(self(writer, request))
    }
}

/// A running server.
pub struct HttpServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    accept_task: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Bind every interface at `port` and start serving in the background.
    ///
    /// Port 0 picks an ephemeral port; see [`local_addr`](Self::local_addr).
    pub async fn serve<H: Handler>(port: u16, handler: H) -> Result<Self, ServerError> {
        let config = ServerConfig {
            listener: ListenerConfig::with_port(port),
            ..ServerConfig::default()
        };
        Self::serve_with_config(&config, handler).await
    }

    /// Bind as configured and start serving in the background.
    ///
    /// Returns as soon as the socket is bound.
    pub async fn serve_with_config<H: Handler>(
        config: &ServerConfig,
        handler: H,
    ) -> Result<Self, ServerError> {
        let listener = Listener::bind(&config.listener).await?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        let shutdown = Shutdown::new();
        let tracker = ConnectionTracker::new();
        let accept_loop = AcceptLoop {
            listener,
            handler: Arc::new(handler),
            shutdown: shutdown.clone(),
            tracker: tracker.clone(),
            buffer_size: config.parser.initial_buffer_size,
        };
        let shutdown_rx = shutdown.subscribe();
        let accept_task = tokio::spawn(accept_loop.run(shutdown_rx));

        tracing::info!(address = %local_addr, "HTTP server started");

        Ok(Self {
            local_addr,
            shutdown,
            tracker,
            accept_task: Some(accept_task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the server still accepts connections.
    pub fn is_alive(&self) -> bool {
        !self.shutdown.is_triggered()
    }

    /// Connections currently being served.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    /// Stop accepting and close the listening socket.
    ///
    /// In-flight connections are not interrupted. Calling `close` twice is
    /// harmless.
    pub async fn close(&mut self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        if let Some(task) = self.accept_task.take() {
            task.await?;
            tracing::info!(address = %self.local_addr, "HTTP server stopped accepting");
        }
        Ok(())
    }

    /// Wait for in-flight connections to finish, up to `grace`.
    ///
    /// Returns `true` if none remain.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        self.tracker.wait_idle(grace).await
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        // The accept task holds the listener; make it let go.
        self.shutdown.trigger();
    }
}

struct AcceptLoop {
    listener: Listener,
    handler: Arc<dyn Handler>,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    buffer_size: usize,
}

impl AcceptLoop {
    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            let accepted = tokio::select! {
                _ = shutdown_rx.recv() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer, permit)) => {
                    metrics::record_connection_accepted();
                    let connection = Connection {
                        stream,
                        peer,
                        guard: self.tracker.track(),
                        _permit: permit,
                        handler: Arc::clone(&self.handler),
                        buffer_size: self.buffer_size,
                    };
                    tokio::spawn(connection.serve());
                }
                Err(e) if self.shutdown.is_triggered() => {
                    tracing::debug!(error = %e, "Accept failed after close");
                    break;
                }
                Err(ListenerError::Closed) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                }
            }
        }

        tracing::debug!("Accept loop exited");
    }
}

/// One accepted connection and everything it needs to serve its request.
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
    handler: Arc<dyn Handler>,
    buffer_size: usize,
}

impl Connection {
    async fn serve(self) {
        let span = tracing::info_span!(
            "connection",
            id = %self.guard.id(),
            peer = %self.peer,
        );
        self.serve_inner().instrument(span).await
    }

    async fn serve_inner(mut self) {
        let start = Instant::now();

        let request = match Request::from_reader_with_capacity(&mut self.stream, self.buffer_size).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Failed to parse request");
                metrics::record_parse_error(e.kind());
                reject(self.stream, &e).await;
                return;
            }
        };

        tracing::debug!(
            method = %request.method(),
            target = %request.target(),
            body_len = request.body().len(),
            "Request parsed"
        );

        let method = request.method().to_string();
        self.handler
            .call(ResponseWriter::new(self.stream), request)
            .await;

        metrics::record_request(&method, start);
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Connection closed"
        );
    }
}

/// Answer a syntactically invalid request with `400 Bad Request`.
///
/// Transport failures and truncated requests get no answer; the peer is
/// gone or never finished sending.
async fn reject(stream: TcpStream, error: &ParseError) {
    if matches!(
        error,
        ParseError::Transport(_) | ParseError::IncompleteRequest { .. }
    ) {
        return;
    }

    let body = format!("{}\n", error);
    let mut writer = ResponseWriter::new(stream);
    let result = async {
        writer.write_status_line(StatusCode::BAD_REQUEST).await?;
        writer.write_headers(&default_headers(body.len())).await?;
        writer.write_body(body.as_bytes()).await
    }
    .await;

    if let Err(e) = result {
        tracing::debug!(error = %e, "Failed to send 400 response");
        return;
    }

    let mut stream = writer.into_inner();
    if stream.shutdown().await.is_ok() {
        linger(&mut stream).await;
    }
}

/// Upper bound on bytes discarded after a rejected request.
const LINGER_MAX_BYTES: usize = 1024 * 1024;

/// Upper bound on time spent discarding after a rejected request.
const LINGER_TIMEOUT: Duration = Duration::from_secs(2);

/// Discard what the peer is still sending before the socket is dropped.
///
/// Closing with unread input resets the connection, and the reset can
/// destroy a response the peer has not read yet. Draining stops at EOF, at
/// [`LINGER_MAX_BYTES`] or after [`LINGER_TIMEOUT`], whichever comes first.
async fn linger(stream: &mut TcpStream) {
    let mut scratch = [0u8; 4096];
    let mut discarded = 0;
    let drain = async {
        while discarded < LINGER_MAX_BYTES {
            match stream.read(&mut scratch).await {
                Ok(0) | Err(_) => break,
                Ok(read) => discarded += read,
            }
        }
    };
    let timed_out = tokio::time::timeout(LINGER_TIMEOUT, drain).await.is_err();
    tracing::trace!(discarded, timed_out, "Lingering close finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hello(mut writer: ResponseWriter<TcpStream>, request: Request) {
        let body = format!("hello {}", request.target());
        let _ = writer.write_status_line(StatusCode::OK).await;
        let _ = writer.write_headers(&default_headers(body.len())).await;
        let _ = writer.write_body(body.as_bytes()).await;
    }

    async fn roundtrip(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    fn loopback(server: &HttpServer) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], server.local_addr().port()))
    }

    #[tokio::test]
    async fn serves_one_request_per_connection() {
        let mut server = HttpServer::serve(0, hello).await.unwrap();
        let addr = loopback(&server);

        let response = roundtrip(addr, b"GET /there HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("connection: close\r\n"));
        assert!(response.ends_with("\r\n\r\nhello /there"));

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let mut server = HttpServer::serve(0, hello).await.unwrap();
        let addr = loopback(&server);

        let response = roundtrip(addr, b"get / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("invalid method"));

        // The accept loop is unaffected.
        let response = roundtrip(addr, b"GET /ok HTTP/1.1\r\n\r\n").await;
        assert!(response.ends_with("hello /ok"));

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_stops_accepting() {
        let mut server = HttpServer::serve(0, hello).await.unwrap();
        let addr = loopback(&server);
        assert!(server.is_alive());

        server.close().await.unwrap();
        assert!(!server.is_alive());
        assert!(TcpStream::connect(addr).await.is_err());

        server.close().await.unwrap();
    }
}
