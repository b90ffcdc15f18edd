//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use httpfromtcp::http::{default_headers, Handler, HttpServer, Request, ResponseWriter, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Start a server on an ephemeral port and return it with a loopback address.
pub async fn start_server<H: Handler>(handler: H) -> (HttpServer, SocketAddr) {
    let server = HttpServer::serve(0, handler).await.unwrap();
    let addr = SocketAddr::from(([127, 0, 0, 1], server.local_addr().port()));
    (server, addr)
}

/// Write `raw` in one go and read the whole response.
pub async fn send(addr: SocketAddr, raw: &[u8]) -> String {
    send_in_pieces(addr, &[raw], Duration::ZERO).await
}

/// Write each piece separately, pausing between them, then read the response.
pub async fn send_in_pieces(addr: SocketAddr, pieces: &[&[u8]], pause: Duration) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    for piece in pieces {
        stream.write_all(piece).await.unwrap();
        stream.flush().await.unwrap();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

/// Responds `200 OK` with the request target and body echoed back.
pub async fn echo(mut writer: ResponseWriter<TcpStream>, request: Request) {
    let body = format!(
        "{} {}\n{}",
        request.method(),
        request.target(),
        String::from_utf8_lossy(request.body())
    );
    let _ = writer.write_status_line(StatusCode::OK).await;
    let _ = writer.write_headers(&default_headers(body.len())).await;
    let _ = writer.write_body(body.as_bytes()).await;
}
