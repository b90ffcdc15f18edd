//! Chunked transfer-coding framing.
//!
//! ```text
//! chunk      = hex-length CRLF payload CRLF
//! last-chunk = "0" CRLF
//! trailers   = *( field-line CRLF ) CRLF
//! ```

use crate::http::headers::Headers;
use crate::http::CRLF;

/// The zero-length chunk that ends a chunked body.
pub const LAST_CHUNK: &[u8] = b"0\r\n";

/// Frame `payload` as one chunk and append it to `out`.
///
/// An empty payload appends nothing: a zero-length chunk is the
/// terminator and must only come from [`LAST_CHUNK`].
pub fn encode_chunk(payload: &[u8], out: &mut Vec<u8>) {
    if payload.is_empty() {
        return;
    }
    out.extend_from_slice(format!("{:x}", payload.len()).as_bytes());
    out.extend_from_slice(CRLF);
    out.extend_from_slice(payload);
    out.extend_from_slice(CRLF);
}

/// Append trailer field lines and the final blank line to `out`.
pub fn encode_trailers(trailers: &Headers, out: &mut Vec<u8>) {
    trailers.encode_fields(out);
    out.extend_from_slice(CRLF);
}

/// Whether `headers` declare chunked as the final transfer coding.
pub fn is_chunked(headers: &Headers) -> bool {
    headers
        .get("transfer-encoding")
        .and_then(|value| value.rsplit(',').next())
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Field names listed in the `Trailer` header, lower-cased.
pub fn declared_trailers(headers: &Headers) -> Vec<String> {
    headers
        .get("trailer")
        .map(|value| {
            value
                .split(',')
                .map(|name| name.trim().to_ascii_lowercase())
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_uses_lowercase_hex_length() {
        let mut out = Vec::new();
        encode_chunk(b"abc", &mut out);
        assert_eq!(out, b"3\r\nabc\r\n");

        out.clear();
        encode_chunk(&[b'x'; 26], &mut out);
        assert!(out.starts_with(b"1a\r\n"));
        assert!(out.ends_with(b"x\r\n"));
    }

    #[test]
    fn empty_payload_is_not_a_terminator() {
        let mut out = Vec::new();
        encode_chunk(b"", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn trailers_end_with_blank_line() {
        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", "3");
        let mut out = Vec::new();
        encode_trailers(&trailers, &mut out);
        assert_eq!(out, b"x-content-length: 3\r\n\r\n");

        out.clear();
        encode_trailers(&Headers::new(), &mut out);
        assert_eq!(out, b"\r\n");
    }

    #[test]
    fn detects_chunked_coding() {
        let mut headers = Headers::new();
        assert!(!is_chunked(&headers));
        headers.set("Transfer-Encoding", "gzip, Chunked");
        assert!(is_chunked(&headers));
        headers.override_value("Transfer-Encoding", "chunked, gzip");
        assert!(!is_chunked(&headers));
    }

    #[test]
    fn lists_declared_trailers() {
        let mut headers = Headers::new();
        headers.set("Trailer", "X-Content-SHA256, X-Content-Length");
        assert_eq!(
            declared_trailers(&headers),
            ["x-content-sha256", "x-content-length"]
        );
        assert!(declared_trailers(&Headers::new()).is_empty());
    }
}
