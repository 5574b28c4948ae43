//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, header
//! capture, and hand-off to static file serving.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating what file serving needs from a request.
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range: Option<String>,
}

/// Main entry point for HTTP request handling.
///
/// Generic over the request body; the body is never read.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method();

    if !matches!(*method, Method::GET | Method::HEAD) {
        logger::log_warning(&format!("Method not allowed: {method}"));
        return Ok(http::build_method_not_allowed());
    }

    let ctx = RequestContext {
        path: req.uri().path(),
        is_head: *method == Method::HEAD,
        if_none_match: header_string(&req, "if-none-match"),
        if_modified_since: header_string(&req, "if-modified-since"),
        range: header_string(&req, "range"),
    };

    Ok(static_files::serve(&ctx, &state).await)
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
