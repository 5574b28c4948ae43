//! HTTP cache validator module
//!
//! `ETag` generation and conditional request evaluation
//! (`If-None-Match`, `If-Modified-Since`).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a quoted `ETag` from file contents.
///
/// The tag combines the content length and a content hash, so files of the
/// same size with different bytes still get distinct tags.
pub fn make_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// Format a filesystem mtime as an HTTP date header value.
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Decide whether the client's cached copy is still fresh (should get 304).
///
/// `If-None-Match` takes precedence over `If-Modified-Since` when both are
/// present.
pub fn is_fresh(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: &str,
    modified: Option<SystemTime>,
) -> bool {
    if let Some(client_etags) = if_none_match {
        return etag_matches(client_etags, etag);
    }
    match (if_modified_since, modified) {
        (Some(since), Some(mtime)) => unmodified_since(since, mtime),
        _ => false,
    }
}

/// `If-None-Match` comparison.
///
/// Handles a single tag, a comma-separated list, and the `*` wildcard.
fn etag_matches(client_etags: &str, etag: &str) -> bool {
    client_etags.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == etag || candidate == "*"
    })
}

/// `If-Modified-Since` comparison at whole-second precision.
///
/// HTTP dates carry no sub-second part, so the mtime is truncated before
/// comparing; otherwise a client echoing our own `Last-Modified` value
/// would never validate.
fn unmodified_since(since_header: &str, modified: SystemTime) -> bool {
    let Ok(since) = httpdate::parse_http_date(since_header) else {
        return false;
    };
    let (Ok(modified), Ok(since)) = (
        modified.duration_since(UNIX_EPOCH),
        since.duration_since(UNIX_EPOCH),
    ) else {
        return false;
    };
    modified.as_secs() <= since.as_secs()
}
