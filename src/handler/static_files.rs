//! Static file serving module
//!
//! Resolves request paths against the asset root, loads file contents, and
//! builds the responses. Resolution never yields a file outside the root:
//! the candidate path is canonicalized and checked for containment, which
//! covers `..` segments, absolute-path joins, and symlinks pointing out.

use crate::config::AppState;
use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

/// Serve the fixed entry file for the root path
pub async fn serve_entry(state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    match load_file(&state.entry_file).await {
        Some((content, content_type)) => http::build_file_response(content, content_type, is_head),
        None => {
            logger::log_error(&format!(
                "entry file '{}' is missing or unreadable",
                state.entry_file.display()
            ));
            http::build_404_response()
        }
    }
}

/// Serve an asset beneath the static root
///
/// `relative` is the request path with the mount prefix already stripped.
pub async fn serve_asset(state: &AppState, relative: &str, is_head: bool) -> Response<Full<Bytes>> {
    match resolve_asset(&state.static_root, relative).await {
        Some((content, content_type)) => http::build_file_response(content, content_type, is_head),
        None => http::build_404_response(),
    }
}

/// Resolve a relative request path to a file inside the static root
///
/// Returns `None` (surfaced as 404) when the path is empty, does not exist,
/// is a directory, escapes the root, or cannot be read.
pub async fn resolve_asset(root: &Path, relative: &str) -> Option<(Vec<u8>, &'static str)> {
    if relative.is_empty() {
        return None;
    }

    // Missing files fail here; that is the ordinary 404 path, not worth a log line
    let canonical = root.join(relative).canonicalize().ok()?;

    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {relative} -> {}",
            canonical.display()
        ));
        return None;
    }

    if !canonical.is_file() {
        return None;
    }

    read_with_type(&canonical).await
}

/// Load a single file with inferred content type
pub async fn load_file(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    if !path.is_file() {
        return None;
    }
    read_with_type(path).await
}

async fn read_with_type(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {}", path.display(), e));
            return None;
        }
    };

    let content_type = mime::content_type_for(path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use std::fs as std_fs;
    use tempfile::TempDir;

    /// A static root inside a scratch directory, with one file placed
    /// outside the root to prove traversal containment.
    fn asset_root() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let root_dir = dir.path().join("assets");
        std_fs::create_dir(&root_dir).unwrap();
        std_fs::write(root_dir.join("app.js"), "console.log(\"hi\")").unwrap();
        std_fs::write(root_dir.join("index.html"), "<h1>Home</h1>").unwrap();
        std_fs::create_dir(root_dir.join("js")).unwrap();
        std_fs::write(root_dir.join("js/game.js"), "let score = 0;").unwrap();
        std_fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        let root = root_dir.canonicalize().unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn test_resolve_existing_file_byte_identical() {
        let (_dir, root) = asset_root();
        let (content, content_type) = resolve_asset(&root, "app.js").await.unwrap();
        assert_eq!(content, b"console.log(\"hi\")");
        assert_eq!(content_type, "application/javascript");
    }

    #[tokio::test]
    async fn test_resolve_nested_path() {
        let (_dir, root) = asset_root();
        let (content, content_type) = resolve_asset(&root, "js/game.js").await.unwrap();
        assert_eq!(content, b"let score = 0;");
        assert_eq!(content_type, "application/javascript");
    }

    #[tokio::test]
    async fn test_resolve_missing_file() {
        let (_dir, root) = asset_root();
        assert!(resolve_asset(&root, "nope.css").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty_path() {
        let (_dir, root) = asset_root();
        assert!(resolve_asset(&root, "").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_rejects_directory() {
        let (_dir, root) = asset_root();
        assert!(resolve_asset(&root, "js").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_blocks_parent_traversal() {
        let (_dir, root) = asset_root();
        // secret.txt exists one level above the root and must stay unreachable
        assert!(resolve_asset(&root, "../secret.txt").await.is_none());
        assert!(resolve_asset(&root, "js/../../secret.txt").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_blocks_absolute_path_join() {
        let (_dir, root) = asset_root();
        assert!(resolve_asset(&root, "/etc/hostname").await.is_none());
    }

    #[tokio::test]
    async fn test_load_entry_file() {
        let (_dir, root) = asset_root();
        let (content, content_type) = load_file(&root.join("index.html")).await.unwrap();
        assert_eq!(content, b"<h1>Home</h1>");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_load_missing_entry_file() {
        let (_dir, root) = asset_root();
        assert!(load_file(&root.join("gone.html")).await.is_none());
    }

    fn state_for(root: &Path) -> AppState {
        let mut cfg = Config::load_from("no_such_config_file").unwrap();
        cfg.routes.static_dir = root.to_str().unwrap().to_string();
        cfg.routes.entry_file = root.join("index.html").to_str().unwrap().to_string();
        AppState::new(cfg).unwrap()
    }

    #[tokio::test]
    async fn test_serve_entry_returns_entry_bytes() {
        let (_dir, root) = asset_root();
        let state = state_for(&root);
        let response = serve_entry(&state, false).await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>Home</h1>");
    }

    #[tokio::test]
    async fn test_serve_entry_missing_file_is_404() {
        let (_dir, root) = asset_root();
        let mut state = state_for(&root);
        state.entry_file = root.join("gone.html");
        let response = serve_entry(&state, false).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_serve_asset_existing_file() {
        let (_dir, root) = asset_root();
        let state = state_for(&root);
        let response = serve_asset(&state, "app.js", false).await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/javascript"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"console.log(\"hi\")");
    }

    #[tokio::test]
    async fn test_serve_asset_missing_file_is_404() {
        let (_dir, root) = asset_root();
        let state = state_for(&root);
        let response = serve_asset(&state, "nope.js", false).await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_serve_asset_traversal_is_404() {
        let (_dir, root) = asset_root();
        let state = state_for(&root);
        let response = serve_asset(&state, "../secret.txt", false).await;
        assert_eq!(response.status(), 404);
    }
}
