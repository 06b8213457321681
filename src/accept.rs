//! Turning `Accept-Encoding` into a preference-ordered list of coding tokens.

use http::HeaderMap;
use http::header::ACCEPT_ENCODING;

/// Returns the acceptable codings of a request, most preferred first.
///
/// Entries are ordered by quality value; entries with equal quality keep the order they
/// were sent in. Entries with `q=0` are dropped. A missing or blank header means anything
/// is acceptable, which is reported as a single `*`.
pub fn acceptable_codings(headers: &HeaderMap) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_encoding_with_quality)
        .filter(|(encoding, quality)| !encoding.is_empty() && *quality > 0.0)
        .map(|(encoding, quality)| (encoding.to_ascii_lowercase(), quality))
        .collect();

    let blank = headers
        .get_all(ACCEPT_ENCODING)
        .iter()
        .all(|v| v.as_bytes().iter().all(|b| b.is_ascii_whitespace() || *b == b','));
    if blank {
        return vec!["*".to_owned()];
    }

    // Stable, so equal qualities keep header order.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.into_iter().map(|(encoding, _)| encoding).collect()
}

/// Parses an encoding entry like "gzip" or "br;q=0.8" into (encoding, quality).
fn parse_encoding_with_quality(s: &str) -> (&str, f32) {
    let mut parts = s.split(';');
    let encoding = parts.next().unwrap_or("").trim();

    let quality = parts
        .find_map(|param| {
            let (name, value) = param.split_once('=')?;
            if name.trim().eq_ignore_ascii_case("q") {
                value.trim().parse::<f32>().ok()
            } else {
                None
            }
        })
        .unwrap_or(1.0);

    (encoding, quality.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn codings(value: &'static str) -> Vec<String> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(value));
        acceptable_codings(&headers)
    }

    #[test]
    fn test_missing_header_is_wildcard() {
        assert_eq!(acceptable_codings(&HeaderMap::new()), vec!["*"]);
    }

    #[test]
    fn test_blank_header_is_wildcard() {
        assert_eq!(codings(""), vec!["*"]);
        assert_eq!(codings(" , "), vec!["*"]);
    }

    #[test]
    fn test_header_order_without_quality() {
        assert_eq!(codings("gzip, deflate, br"), vec!["gzip", "deflate", "br"]);
    }

    #[test]
    fn test_sorted_by_quality() {
        assert_eq!(
            codings("gzip;q=0.5, br;q=1.0, deflate"),
            vec!["br", "deflate", "gzip"]
        );
        assert_eq!(
            codings("* ;q= 0.6, identity ;q= 0.7"),
            vec!["identity", "*"]
        );
    }

    #[test]
    fn test_quality_zero_dropped() {
        assert_eq!(codings("gzip;q=0, br"), vec!["br"]);
        // Everything refused is not the same as no header at all.
        assert!(codings("gzip;q=0").is_empty());
    }

    #[test]
    fn test_case_and_params() {
        assert_eq!(codings("GZip;level=1;Q=0.3, BR"), vec!["br", "gzip"]);
    }

    #[test]
    fn test_multiple_header_lines() {
        let mut headers = HeaderMap::new();
        headers.append(ACCEPT_ENCODING, HeaderValue::from_static("deflate"));
        headers.append(ACCEPT_ENCODING, HeaderValue::from_static("br;q=0.9, gzip"));
        assert_eq!(acceptable_codings(&headers), vec!["deflate", "gzip", "br"]);
    }
}
