//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! matching, and access logging for each completed request.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let http_version = version_label(req.version());
    let referer = header_value(&req, "referer");
    let user_agent = header_value(&req, "user-agent");
    let is_head = method == Method::HEAD;

    let mut response = if matches!(method, Method::GET | Method::HEAD) {
        route_request(&path, is_head, &state).await
    } else {
        logger::log_warning(&format!("Method not allowed: {method} {path}"));
        http::build_405_response()
    };

    if let Ok(name) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, name);
    }

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(remote_addr.ip().to_string(), method.to_string(), path);
        entry.query = query;
        entry.http_version = http_version.to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = body_size(&response);
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route a GET/HEAD request based on its path
///
/// Two routes exist: the root serves the fixed entry file, and paths under
/// the mount prefix serve assets from the static root. Everything else
/// is 404. Query parameters never participate in routing.
async fn route_request(path: &str, is_head: bool, state: &Arc<AppState>) -> Response<Full<Bytes>> {
    if path == "/" {
        return static_files::serve_entry(state, is_head).await;
    }

    if let Some(relative) = strip_mount_prefix(path, &state.config.routes.mount_prefix) {
        return static_files::serve_asset(state, relative, is_head).await;
    }

    http::build_404_response()
}

/// Strip the mount prefix from a request path
///
/// Returns the asset-relative remainder only when the path actually sits
/// beneath the prefix; `/staticx` does not match a `/static` mount.
fn strip_mount_prefix<'a>(path: &'a str, mount_prefix: &str) -> Option<&'a str> {
    path.strip_prefix(mount_prefix)?.strip_prefix('/')
}

/// Response body size as reported by the body itself (exact for `Full`)
fn body_size(response: &Response<Full<Bytes>>) -> usize {
    response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// HTTP version label for the access log
fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else if version == Version::HTTP_3 {
        "3"
    } else {
        "1.1"
    }
}

/// Extract a request header as an owned string
fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_mount_prefix_matches() {
        assert_eq!(strip_mount_prefix("/static/app.js", "/static"), Some("app.js"));
        assert_eq!(
            strip_mount_prefix("/static/js/game.js", "/static"),
            Some("js/game.js")
        );
    }

    #[test]
    fn test_strip_mount_prefix_rejects_bare_prefix() {
        // "/static" without a trailing segment is not an asset request
        assert_eq!(strip_mount_prefix("/static", "/static"), None);
    }

    #[test]
    fn test_strip_mount_prefix_rejects_lookalike_paths() {
        assert_eq!(strip_mount_prefix("/staticx/app.js", "/static"), None);
        assert_eq!(strip_mount_prefix("/other/app.js", "/static"), None);
        assert_eq!(strip_mount_prefix("/", "/static"), None);
    }

    #[test]
    fn test_strip_mount_prefix_empty_remainder() {
        // "/static/" strips to an empty remainder; resolution rejects it later
        assert_eq!(strip_mount_prefix("/static/", "/static"), Some(""));
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(Version::HTTP_11), "1.1");
        assert_eq!(version_label(Version::HTTP_10), "1.0");
        assert_eq!(version_label(Version::HTTP_2), "2");
    }
}
