//! Header store.
//!
//! # Responsibilities
//! - Normalize field names to lower-case before every store or lookup
//! - Combine repeated fields into one comma-separated value
//! - Validate field names against the token grammar while parsing
//! - Enumerate fields in insertion order for deterministic output

use indexmap::IndexMap;

use crate::http::error::{ParseError, ParseResult};
use crate::http::CRLF;

/// Case-insensitive header container.
///
/// Each name maps to a single value. Setting a name twice appends
/// `", " + value` to the existing entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    /// Create an empty header store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single field line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line
    /// ending the header section was reached. Zero bytes consumed means no
    /// complete line is buffered yet.
    pub fn parse(&mut self, data: &[u8]) -> ParseResult<(usize, bool)> {
        let Some(idx) = find_crlf(data) else {
            return Ok((0, false));
        };

        if idx == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = &data[..idx];
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Err(ParseError::MalformedFieldLine(
                String::from_utf8_lossy(line).into_owned(),
            ));
        };

        let name = &line[..colon];
        if name.first().is_some_and(|b| is_whitespace(*b))
            || name.last().is_some_and(|b| is_whitespace(*b))
        {
            return Err(ParseError::SpaceInFieldName(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }

        if !is_token(name) {
            return Err(ParseError::InvalidHeaderToken(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }

        let value = trim_whitespace(&line[colon + 1..]);

        // Token bytes are ASCII, so the name conversion is lossless.
        let name = String::from_utf8_lossy(name);
        let value = String::from_utf8_lossy(value);
        self.set(&name, &value);

        Ok((idx + CRLF.len(), false))
    }

    /// Store a value, appending to any value already present under `name`.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.get_mut(&name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.entries.insert(name, value.to_string());
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Replace the value under `name`, discarding whatever was there.
    ///
    /// An existing entry keeps its position in the enumeration order.
    pub fn override_value(&mut self, name: &str, value: &str) {
        self.entries
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    /// Remove `name`, returning its value if it was present.
    pub fn delete(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(&name.to_ascii_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Render every entry as `name: value\r\n`, without the closing blank line.
    pub(crate) fn encode_fields(&self, out: &mut Vec<u8>) {
        for (name, value) in self.iter() {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(CRLF);
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Whether `name` is a non-empty RFC 9110 token.
pub fn is_token(name: &[u8]) -> bool {
    !name.is_empty() && name.iter().all(|&b| is_token_char(b))
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn trim_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !is_whitespace(*first) {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !is_whitespace(*last) {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Parse a `Content-Length` value: ASCII digits only, no sign or padding.
pub(crate) fn parse_content_length(raw: &str) -> Option<usize> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Position of the first CRLF in `data`.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|w| w == CRLF)
}
