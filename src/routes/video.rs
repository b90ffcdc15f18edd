//! Serves a single video file.

use std::path::Path;

use httpfromtcp::http::{default_headers, ResponseWriter, StatusCode, WriteResult};
use tokio::io::AsyncWrite;

use super::pages;

pub async fn serve<W>(mut writer: ResponseWriter<W>, path: &Path) -> WriteResult<()>
where
    W: AsyncWrite + Unpin,
{
    let video = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Failed to read video file");
            return pages::respond(
                writer,
                StatusCode::INTERNAL_SERVER_ERROR,
                pages::INTERNAL_ERROR_HTML,
            )
            .await;
        }
    };

    let mut headers = default_headers(video.len());
    headers.override_value("Content-Type", "video/mp4");

    writer.write_status_line(StatusCode::OK).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(&video).await?;
    Ok(())
}
