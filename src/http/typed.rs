//! Typestate front-end for [`ResponseWriter`].
//!
//! Each stage owns the writer and only exposes the next legal call, so an
//! out-of-order write does not compile:
//!
//! ```text
//! AwaitingStatus ─status_line→ AwaitingHeaders ─headers→ BodyStage
//!     BodyStage::Fixed(FixedBody)     ─body→   Finished
//!     BodyStage::Chunked(ChunkedBody) ─chunk*→ done → AwaitingTrailers ─trailers→ Finished
//!     BodyStage::Unframed(Finished)
//! ```

use tokio::io::AsyncWrite;

use crate::http::error::WriteResult;
use crate::http::headers::Headers;
use crate::http::response::{ResponseWriter, StatusCode, WriterPhase};

/// Nothing written yet.
#[derive(Debug)]
pub struct AwaitingStatus<W>(ResponseWriter<W>);

/// Status line written; headers next.
#[derive(Debug)]
pub struct AwaitingHeaders<W>(ResponseWriter<W>);

/// Headers declared Content-Length; exactly one body write remains.
#[derive(Debug)]
pub struct FixedBody<W>(ResponseWriter<W>);

/// Headers declared chunked framing; stream chunks, then finish.
#[derive(Debug)]
pub struct ChunkedBody<W>(ResponseWriter<W>);

/// Terminal chunk written; trailers close the message.
#[derive(Debug)]
pub struct AwaitingTrailers<W>(ResponseWriter<W>);

/// The response is complete.
#[derive(Debug)]
pub struct Finished<W>(ResponseWriter<W>);

/// What the declared headers allow next.
#[derive(Debug)]
pub enum BodyStage<W> {
    Fixed(FixedBody<W>),
    Chunked(ChunkedBody<W>),
    /// No body framing was declared, so no body can follow.
    Unframed(Finished<W>),
}

impl<W> AwaitingStatus<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self(ResponseWriter::new(sink))
    }

    pub(crate) fn from_writer(writer: ResponseWriter<W>) -> Self {
        Self(writer)
    }

    pub async fn status_line(mut self, code: StatusCode) -> WriteResult<AwaitingHeaders<W>> {
        self.0.write_status_line(code).await?;
        Ok(AwaitingHeaders(self.0))
    }
}

impl<W> AwaitingHeaders<W>
where
    W: AsyncWrite + Unpin,
{
    /// Write the headers and branch on the framing they declare.
    pub async fn headers(mut self, headers: &Headers) -> WriteResult<BodyStage<W>> {
        self.0.write_headers(headers).await?;

        let stage = if headers.contains("content-length") {
            BodyStage::Fixed(FixedBody(self.0))
        } else if crate::http::chunked::is_chunked(headers) {
            BodyStage::Chunked(ChunkedBody(self.0))
        } else {
            BodyStage::Unframed(Finished(self.0))
        };
        Ok(stage)
    }
}

impl<W> FixedBody<W>
where
    W: AsyncWrite + Unpin,
{
    pub async fn body(mut self, body: &[u8]) -> WriteResult<Finished<W>> {
        self.0.write_body(body).await?;
        Ok(Finished(self.0))
    }
}

impl<W> ChunkedBody<W>
where
    W: AsyncWrite + Unpin,
{
    /// Write one chunk; returns the framed size.
    pub async fn chunk(&mut self, bytes: &[u8]) -> WriteResult<usize> {
        self.0.write_chunked_body(bytes).await
    }

    /// Write the terminating zero-length chunk.
    pub async fn done(mut self) -> WriteResult<AwaitingTrailers<W>> {
        self.0.write_chunked_body_done().await?;
        Ok(AwaitingTrailers(self.0))
    }
}

impl<W> AwaitingTrailers<W>
where
    W: AsyncWrite + Unpin,
{
    pub async fn trailers(mut self, trailers: &Headers) -> WriteResult<Finished<W>> {
        self.0.write_trailers(trailers).await?;
        Ok(Finished(self.0))
    }

    /// Close the message without any trailer fields.
    pub async fn finish(self) -> WriteResult<Finished<W>> {
        self.trailers(&Headers::new()).await
    }
}

impl<W> Finished<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn phase(&self) -> WriterPhase {
        self.0.phase()
    }

    pub fn into_inner(self) -> W {
        self.0.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::default_headers;

    #[tokio::test]
    async fn fixed_body_flow() {
        let stage = AwaitingStatus::new(Vec::new())
            .status_line(StatusCode::BAD_REQUEST)
            .await
            .unwrap()
            .headers(&default_headers(2))
            .await
            .unwrap();

        let BodyStage::Fixed(body) = stage else {
            panic!("expected Content-Length framing");
        };
        let finished = body.body(b"no").await.unwrap();
        assert_eq!(finished.phase(), WriterPhase::Done);

        let out = String::from_utf8(finished.into_inner()).unwrap();
        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(out.ends_with("\r\n\r\nno"));
    }

    #[tokio::test]
    async fn chunked_flow() {
        let mut headers = default_headers(0);
        headers.delete("content-length");
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Trailer", "X-Count");

        let stage = AwaitingStatus::new(Vec::new())
            .status_line(StatusCode::OK)
            .await
            .unwrap()
            .headers(&headers)
            .await
            .unwrap();

        let BodyStage::Chunked(mut body) = stage else {
            panic!("expected chunked framing");
        };
        body.chunk(b"hello").await.unwrap();
        body.chunk(b" world").await.unwrap();

        let mut trailers = Headers::new();
        trailers.set("X-Count", "2");
        let finished = body.done().await.unwrap().trailers(&trailers).await.unwrap();

        let out = String::from_utf8(finished.into_inner()).unwrap();
        assert!(out.ends_with("5\r\nhello\r\n6\r\n world\r\n0\r\nx-count: 2\r\n\r\n"));
    }

    #[tokio::test]
    async fn unframed_headers_finish_immediately() {
        let mut headers = Headers::new();
        headers.set("Connection", "close");

        let stage = AwaitingStatus::new(Vec::new())
            .status_line(StatusCode::new(204))
            .await
            .unwrap()
            .headers(&headers)
            .await
            .unwrap();

        let BodyStage::Unframed(finished) = stage else {
            panic!("expected no body framing");
        };
        assert_eq!(finished.phase(), WriterPhase::Done);
    }
}
