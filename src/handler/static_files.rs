//! Static file serving module
//!
//! Maps sanitized request paths onto the serving root, resolves index
//! files for directories, and assembles conditional/range-aware
//! responses.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Outcome of mapping a request path onto the filesystem.
enum Resolved {
    NotFound,
    Found {
        data: Vec<u8>,
        content_type: &'static str,
        modified: Option<SystemTime>,
    },
}

/// Serve a request from the configured root directory.
///
/// Missing files (and anything that sanitizes away) answer 404; I/O
/// failures on an existing file answer 500 and are logged. The process
/// never dies on a per-request error.
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    match resolve_file(ctx.path, state).await {
        Ok(Resolved::Found {
            data,
            content_type,
            modified,
        }) => build_file_response(ctx, data, content_type, modified),
        Ok(Resolved::NotFound) => http::build_not_found(),
        Err(e) => {
            logger::log_error(&format!("Failed to serve '{}': {e}", ctx.path));
            http::build_internal_error()
        }
    }
}

/// Decode and sanitize a URL path into a relative filesystem path.
///
/// Empty and `.` segments are dropped; undecodable input, NUL bytes, and
/// any `..` segment reject the whole path.
fn sanitize_path(raw: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut clean = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            _ => clean.push(segment),
        }
    }
    Some(clean)
}

async fn resolve_file(raw_path: &str, state: &AppState) -> io::Result<Resolved> {
    let Some(relative) = sanitize_path(raw_path) else {
        logger::log_warning(&format!("Rejected request path: {raw_path}"));
        return Ok(Resolved::NotFound);
    };

    let root = match fs::canonicalize(&state.root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Serving root '{}' not accessible: {e}",
                state.root.display()
            ));
            return Ok(Resolved::NotFound);
        }
    };

    let mut path = root.join(relative);
    let mut meta = match fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Resolved::NotFound),
        Err(e) => return Err(e),
    };

    // Directory requests (including "/") fall back to the index files
    if meta.is_dir() {
        let Some((index_path, index_meta)) = find_index(&path, &state.index_files).await else {
            return Ok(Resolved::NotFound);
        };
        path = index_path;
        meta = index_meta;
    }

    // Symlinks may still point outside the root after sanitization
    let canonical = match fs::canonicalize(&path).await {
        Ok(p) => p,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Resolved::NotFound),
        Err(e) => return Err(e),
    };
    if !canonical.starts_with(&root) {
        logger::log_warning(&format!(
            "Blocked path escaping the serving root: {raw_path}"
        ));
        return Ok(Resolved::NotFound);
    }

    let data = match fs::read(&canonical).await {
        Ok(d) => d,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Resolved::NotFound),
        Err(e) => return Err(e),
    };

    Ok(Resolved::Found {
        data,
        content_type: mime::content_type_for(&path),
        modified: meta.modified().ok(),
    })
}

/// Try the configured index files, in order, inside a directory.
async fn find_index(dir: &Path, index_files: &[String]) -> Option<(PathBuf, Metadata)> {
    for name in index_files {
        let candidate = dir.join(name);
        if let Ok(meta) = fs::metadata(&candidate).await {
            if meta.is_file() {
                return Some((candidate, meta));
            }
        }
    }
    None
}

/// Assemble the response for a resolved file: 304 for a fresh cached
/// copy, 206/416 for range requests, full 200 otherwise.
fn build_file_response(
    ctx: &RequestContext<'_>,
    data: Vec<u8>,
    content_type: &'static str,
    modified: Option<SystemTime>,
) -> Response<Full<Bytes>> {
    let etag = cache::make_etag(&data);

    if cache::is_fresh(
        ctx.if_none_match.as_deref(),
        ctx.if_modified_since.as_deref(),
        &etag,
        modified,
    ) {
        return http::build_not_modified(&etag);
    }

    let last_modified = modified.map(cache::http_date);
    let total_size = data.len();

    match range::evaluate(ctx.range.as_deref(), total_size) {
        range::RangeOutcome::Partial(r) => http::response::build_partial(
            Bytes::copy_from_slice(&data[r.start..=r.end]),
            content_type,
            &etag,
            last_modified.as_deref(),
            r,
            total_size,
            ctx.is_head,
        ),
        range::RangeOutcome::Unsatisfiable => http::build_range_not_satisfiable(total_size),
        range::RangeOutcome::Full => http::response::build_file(
            Bytes::from(data),
            content_type,
            &etag,
            last_modified.as_deref(),
            ctx.is_head,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn fixture_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("staticd-files-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn state_for(root: PathBuf) -> AppState {
        AppState {
            root,
            index_files: vec!["index.html".to_string()],
        }
    }

    fn get(path: &str) -> RequestContext<'_> {
        RequestContext {
            path,
            is_head: false,
            if_none_match: None,
            if_modified_since: None,
            range: None,
        }
    }

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/"), Some(PathBuf::new()));
        assert_eq!(sanitize_path("/style.css"), Some(PathBuf::from("style.css")));
        assert_eq!(sanitize_path("/a//b/./c"), Some(PathBuf::from("a/b/c")));
        assert_eq!(
            sanitize_path("/hello%20world.txt"),
            Some(PathBuf::from("hello world.txt"))
        );
        assert_eq!(sanitize_path("/../secret"), None);
        assert_eq!(sanitize_path("/a/%2e%2e/b"), None);
        assert_eq!(sanitize_path("/%00"), None);
        assert_eq!(sanitize_path("/%ff%fe"), None);
    }

    #[tokio::test]
    async fn test_root_serves_index_html() {
        let root = fixture_root("root-index");
        std::fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();

        let resp = serve(&get("/"), &state_for(root.clone())).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
        let expected = std::fs::read(root.join("index.html")).unwrap();
        assert_eq!(body_bytes(resp).await, expected);
    }

    #[tokio::test]
    async fn test_existing_file_served_byte_exact() {
        let root = fixture_root("exact-bytes");
        let css = b"body { color: #333; }\n".to_vec();
        std::fs::write(root.join("style.css"), &css).unwrap();

        let resp = serve(&get("/style.css"), &state_for(root)).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("Content-Type").unwrap(), "text/css");
        assert_eq!(
            resp.headers().get("Content-Length").unwrap(),
            &css.len().to_string()
        );
        assert_eq!(body_bytes(resp).await, css);
    }

    #[tokio::test]
    async fn test_missing_path_is_404() {
        let root = fixture_root("missing");
        let resp = serve(&get("/does-not-exist.xyz"), &state_for(root)).await;
        assert_eq!(resp.status(), 404);
        assert_eq!(body_bytes(resp).await, b"404 Not Found");
    }

    #[tokio::test]
    async fn test_traversal_is_blocked() {
        let root = fixture_root("traversal");
        std::fs::write(root.join("index.html"), b"ok").unwrap();
        // A real file one level above the root
        std::fs::write(root.parent().unwrap().join("outside.txt"), b"secret").unwrap();

        let state = state_for(root);
        assert_eq!(serve(&get("/../outside.txt"), &state).await.status(), 404);
        assert_eq!(
            serve(&get("/%2e%2e/outside.txt"), &state).await.status(),
            404
        );
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404() {
        let root = fixture_root("no-index");
        std::fs::create_dir_all(root.join("empty")).unwrap();

        let resp = serve(&get("/empty"), &state_for(root)).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_subdirectory_index_resolution() {
        let root = fixture_root("sub-index");
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("docs/index.html"), b"<p>docs</p>").unwrap();

        let resp = serve(&get("/docs"), &state_for(root)).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await, b"<p>docs</p>");
    }

    #[tokio::test]
    async fn test_head_mirrors_get_without_body() {
        let root = fixture_root("head");
        std::fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();

        let mut ctx = get("/");
        ctx.is_head = true;
        let resp = serve(&ctx, &state_for(root)).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("Content-Length").unwrap(), "13");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_etag_revalidation_returns_304() {
        let root = fixture_root("etag");
        std::fs::write(root.join("app.js"), b"console.log(1);").unwrap();
        let state = state_for(root);

        let first = serve(&get("/app.js"), &state).await;
        let etag = first.headers().get("ETag").unwrap().to_str().unwrap().to_string();

        let mut ctx = get("/app.js");
        ctx.if_none_match = Some(etag.clone());
        let second = serve(&ctx, &state).await;
        assert_eq!(second.status(), 304);
        assert_eq!(second.headers().get("ETag").unwrap().to_str().unwrap(), etag);
        assert!(body_bytes(second).await.is_empty());
    }

    #[tokio::test]
    async fn test_modified_since_revalidation_returns_304() {
        let root = fixture_root("modified-since");
        std::fs::write(root.join("data.json"), b"{}").unwrap();
        let state = state_for(root);

        let first = serve(&get("/data.json"), &state).await;
        let date = first
            .headers()
            .get("Last-Modified")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let mut ctx = get("/data.json");
        ctx.if_modified_since = Some(date);
        let second = serve(&ctx, &state).await;
        assert_eq!(second.status(), 304);
    }

    #[tokio::test]
    async fn test_range_request_served_partially() {
        let root = fixture_root("range");
        std::fs::write(root.join("digits.txt"), b"0123456789").unwrap();

        let mut ctx = get("/digits.txt");
        ctx.range = Some("bytes=2-5".to_string());
        let resp = serve(&ctx, &state_for(root)).await;
        assert_eq!(resp.status(), 206);
        assert_eq!(
            resp.headers().get("Content-Range").unwrap(),
            "bytes 2-5/10"
        );
        assert_eq!(body_bytes(resp).await, b"2345");
    }

    #[tokio::test]
    async fn test_range_past_eof_is_416() {
        let root = fixture_root("range-416");
        std::fs::write(root.join("digits.txt"), b"0123456789").unwrap();

        let mut ctx = get("/digits.txt");
        ctx.range = Some("bytes=50-".to_string());
        let resp = serve(&ctx, &state_for(root)).await;
        assert_eq!(resp.status(), 416);
        assert_eq!(
            resp.headers().get("Content-Range").unwrap(),
            "bytes */10"
        );
    }

    #[tokio::test]
    async fn test_repeated_requests_identical() {
        let root = fixture_root("idempotent");
        std::fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();
        let state = state_for(root);

        let first = serve(&get("/"), &state).await;
        let second = serve(&get("/"), &state).await;
        assert_eq!(first.status(), second.status());
        assert_eq!(first.headers().get("ETag"), second.headers().get("ETag"));
        assert_eq!(body_bytes(first).await, body_bytes(second).await);
    }

    #[tokio::test]
    async fn test_inaccessible_root_is_404() {
        let root = std::env::temp_dir().join("staticd-files-nonexistent-root");
        let _ = std::fs::remove_dir_all(&root);

        let resp = serve(&get("/index.html"), &state_for(root)).await;
        assert_eq!(resp.status(), 404);
    }
}
