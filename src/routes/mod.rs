//! Demo routes for the `httpfromtcp` binary.
//!
//! | target          | response                                        |
//! |-----------------|-------------------------------------------------|
//! | `/yourproblem`  | 400 HTML page                                   |
//! | `/myproblem`    | 500 HTML page                                   |
//! | `/video`        | the configured MP4 file                         |
//! | `/httpbin/*`    | upstream body relayed chunked, hash in trailers |
//! | anything else   | 200 HTML page                                   |

mod httpbin;
mod pages;
mod video;

use std::path::PathBuf;
use std::sync::Arc;

use httpfromtcp::http::{Request, ResponseWriter, StatusCode};
use tokio::io::AsyncWrite;

/// Shared state for every request.
#[derive(Debug, Clone)]
pub struct Routes {
    video_path: Arc<PathBuf>,
    upstream: Arc<str>,
    client: reqwest::Client,
}

impl Routes {
    pub fn new(video_path: PathBuf, upstream: &str) -> Self {
        Self {
            video_path: Arc::new(video_path),
            upstream: Arc::from(upstream),
            client: reqwest::Client::new(),
        }
    }

    /// Dispatch on the request target and write the response.
    pub async fn handle<W>(&self, writer: ResponseWriter<W>, request: Request)
    where
        W: AsyncWrite + Unpin + Send,
    {
        let target = request.target();
        let result = if let Some(path) = target.strip_prefix("/httpbin") {
            httpbin::proxy(&self.client, &self.upstream, path, writer).await
        } else {
            match target {
                "/yourproblem" => {
                    pages::respond(writer, StatusCode::BAD_REQUEST, pages::BAD_REQUEST_HTML).await
                }
                "/myproblem" => {
                    pages::respond(
                        writer,
                        StatusCode::INTERNAL_SERVER_ERROR,
                        pages::INTERNAL_ERROR_HTML,
                    )
                    .await
                }
                "/video" => video::serve(writer, &self.video_path).await,
                _ => pages::respond(writer, StatusCode::OK, pages::SUCCESS_HTML).await,
            }
        };

        if let Err(e) = result {
            tracing::error!(error = %e, target = %target, "Failed to write response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: &str) -> Request {
        let mut request = Request::new();
        request
            .parse(format!("GET {} HTTP/1.1\r\nHost: localhost:42069\r\n\r\n", target).as_bytes())
            .unwrap();
        request
    }

    async fn respond(target: &str) -> String {
        let routes = Routes::new(PathBuf::from("/nonexistent/vim.mp4"), "http://127.0.0.1:9");
        let mut out = Vec::new();
        routes
            .handle(ResponseWriter::new(&mut out), request(target))
            .await;
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn known_problem_pages() {
        let response = respond("/yourproblem").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(response.contains("content-type: text/html\r\n"));
        assert!(response.ends_with(pages::BAD_REQUEST_HTML));

        let response = respond("/myproblem").await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert!(response.ends_with(pages::INTERNAL_ERROR_HTML));
    }

    #[tokio::test]
    async fn everything_else_succeeds() {
        let response = respond("/anything").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains(&format!("content-length: {}\r\n", pages::SUCCESS_HTML.len())));
        assert!(response.ends_with(pages::SUCCESS_HTML));
    }

    #[tokio::test]
    async fn missing_video_is_internal_error() {
        let response = respond("/video").await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_internal_error() {
        let response = respond("/httpbin/stream/3").await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }
}
