//! Static HTML pages.

use httpfromtcp::http::{default_headers, ResponseWriter, StatusCode, WriteResult};
use tokio::io::AsyncWrite;

pub const SUCCESS_HTML: &str = r#"<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>"#;

pub const BAD_REQUEST_HTML: &str = r#"<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>"#;

pub const INTERNAL_ERROR_HTML: &str = r#"<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>"#;

/// Write `html` as a complete `text/html` response.
pub async fn respond<W>(mut writer: ResponseWriter<W>, status: StatusCode, html: &str) -> WriteResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut headers = default_headers(html.len());
    headers.override_value("Content-Type", "text/html");

    writer.write_status_line(status).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(html.as_bytes()).await?;
    Ok(())
}
