//! Relays an upstream body as a chunked response.
//!
//! The response length is unknown up front, so the body is streamed chunk
//! by chunk and its SHA-256 and length follow as trailers.

use std::fmt::Display;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use httpfromtcp::http::{
    default_headers, BodyStage, Headers, ResponseWriter, StatusCode, WriteError, WriteResult,
};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWrite;

use super::pages;

const TRAILER_SHA256: &str = "X-Content-SHA256";
const TRAILER_LENGTH: &str = "X-Content-Length";

/// Fetch `path` from `upstream` and relay it chunked.
pub async fn proxy<W>(
    client: &reqwest::Client,
    upstream: &str,
    path: &str,
    writer: ResponseWriter<W>,
) -> WriteResult<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let url = format!(
        "{}/{}",
        upstream.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, url = %url, "Upstream request failed");
            return pages::respond(
                writer,
                StatusCode::INTERNAL_SERVER_ERROR,
                pages::INTERNAL_ERROR_HTML,
            )
            .await;
        }
    };

    let status = StatusCode::new(response.status().as_u16());
    let chunks = futures_util::stream::unfold(Some(response), |state| async move {
        let mut response = state?;
        match response.chunk().await {
            Ok(Some(bytes)) => Some((Ok(bytes), Some(response))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    });

    relay_chunked(writer, status, chunks).await
}

/// Stream `upstream` to `writer` with chunked framing.
///
/// If the upstream fails mid-body the terminal chunk is still written so
/// the client sees a well-formed, if short, message; trailers are skipped.
pub async fn relay_chunked<W, S, E>(
    writer: ResponseWriter<W>,
    status: StatusCode,
    upstream: S,
) -> WriteResult<()>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut headers = default_headers(0);
    headers.delete("Content-Length");
    headers.set("Transfer-Encoding", "chunked");
    headers.set("Trailer", &format!("{}, {}", TRAILER_SHA256, TRAILER_LENGTH));

    let stage = writer
        .staged()?
        .status_line(status)
        .await?
        .headers(&headers)
        .await?;
    let BodyStage::Chunked(mut body) = stage else {
        return Err(WriteError::FramingMismatch {
            operation: "relay_chunked",
            declared: "non-chunked framing",
        });
    };

    let mut hasher = Sha256::new();
    let mut relayed = 0usize;

    futures_util::pin_mut!(upstream);
    while let Some(next) = upstream.next().await {
        match next {
            Ok(bytes) => {
                hasher.update(&bytes);
                relayed += bytes.len();
                body.chunk(&bytes).await?;
                tracing::trace!(bytes = bytes.len(), relayed, "Relayed chunk");
            }
            Err(e) => {
                tracing::warn!(error = %e, relayed, "Upstream failed mid-body");
                body.done().await?.finish().await?;
                return Ok(());
            }
        }
    }

    let mut trailers = Headers::new();
    trailers.set(TRAILER_SHA256, &format!("{:x}", hasher.finalize()));
    trailers.set(TRAILER_LENGTH, &relayed.to_string());
    body.done().await?.trailers(&trailers).await?;

    tracing::debug!(relayed, "Upstream relay complete");
    Ok(())
}
