// Application state module
// Immutable state shared by every connection task

use std::io;
use std::path::{Path, PathBuf};

use super::types::Config;

/// Shared application state, built once at startup.
///
/// The static root is canonicalized here so that per-request containment
/// checks compare against a stable absolute path, and so that a missing
/// asset directory fails at startup instead of turning every request
/// into a 404.
pub struct AppState {
    pub config: Config,
    /// Canonical absolute path of the static asset directory
    pub static_root: PathBuf,
    /// Path of the file served for `/`
    pub entry_file: PathBuf,
}

impl AppState {
    pub fn new(config: Config) -> io::Result<Self> {
        let static_root = Path::new(&config.routes.static_dir)
            .canonicalize()
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!(
                        "static directory '{}' is not accessible: {e}",
                        config.routes.static_dir
                    ),
                )
            })?;
        let entry_file = PathBuf::from(&config.routes.entry_file);

        Ok(Self {
            config,
            static_root,
            entry_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config(static_dir: &str) -> Config {
        let mut cfg = Config::load_from("no_such_config_file").unwrap();
        cfg.routes.static_dir = static_dir.to_string();
        cfg
    }

    #[test]
    fn test_missing_static_dir_fails_startup() {
        let cfg = test_config("definitely/not/a/real/dir");
        assert!(AppState::new(cfg).is_err());
    }

    #[test]
    fn test_static_root_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path().to_str().unwrap());
        let state = AppState::new(cfg).unwrap();
        assert!(state.static_root.is_absolute());
        assert_eq!(state.static_root, dir.path().canonicalize().unwrap());
    }
}
