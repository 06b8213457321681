//! The `Content-Encoding` coding history.
//!
//! Read left to right, the history lists codings in the order they were applied to the
//! body. A client undoes them starting from the rightmost entry.

use crate::error::Error;
use crate::negotiate::Coding;
use http::header::CONTENT_ENCODING;
use http::{HeaderMap, HeaderValue};

/// Returns the recorded codings, earliest applied first.
///
/// A missing header is an empty history. Comma-separated values and repeated header lines
/// are flattened in order.
pub fn codings(headers: &HeaderMap) -> Vec<String> {
    entries(headers)
        .iter()
        .flat_map(|value| value.split(|b| *b == b','))
        .map(|part| String::from_utf8_lossy(part.trim_ascii()).into_owned())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Records a coding applied *after* everything already in the history.
///
/// Used where stages see the response in data order, innermost stage first.
pub fn append(headers: &mut HeaderMap, coding: &Coding) -> Result<(), Error> {
    let mut value = joined(headers);
    if !value.is_empty() {
        value.extend_from_slice(b", ");
    }
    value.extend_from_slice(coding.name().as_bytes());
    replace(headers, &value)
}

/// Records a coding applied *before* everything already in the history.
///
/// Used where stages run in registration order, which is the reverse of data order.
pub fn prepend(headers: &mut HeaderMap, coding: &Coding) -> Result<(), Error> {
    let existing = joined(headers);
    let mut value = coding.name().as_bytes().to_vec();
    if !existing.is_empty() {
        value.extend_from_slice(b", ");
        value.extend_from_slice(&existing);
    }
    replace(headers, &value)
}

fn entries(headers: &HeaderMap) -> Vec<&[u8]> {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .map(|value| value.as_bytes().trim_ascii())
        .filter(|value| !value.is_empty())
        .collect()
}

fn joined(headers: &HeaderMap) -> Vec<u8> {
    entries(headers).join(&b", "[..])
}

fn replace(headers: &mut HeaderMap, value: &[u8]) -> Result<(), Error> {
    let value = HeaderValue::from_bytes(value)?;
    headers.insert(CONTENT_ENCODING, value);
    Ok(())
}
