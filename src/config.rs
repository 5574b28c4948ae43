// Configuration module
// Typed settings (defaults + environment overrides) and the immutable
// state shared across connections.

use serde::Deserialize;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub routes: RoutesConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Explicit serving root. When unset, the directory one level above
    /// the executable's own directory is served.
    pub root: Option<PathBuf>,
}

/// Routes configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RoutesConfig {
    /// Files tried, in order, when a request maps to a directory.
    pub index_files: Vec<String>,
}

impl Config {
    /// Load configuration from defaults overridden by `STATICD__*`
    /// environment variables (e.g. `STATICD__SERVER__ROOT=/srv/site`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("STATICD").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("routes.index_files", vec!["index.html"])?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid listen address: {e}"))
    }
}

/// Immutable state shared across connections.
#[derive(Debug)]
pub struct AppState {
    pub root: PathBuf,
    pub index_files: Vec<String>,
}

impl AppState {
    pub fn new(cfg: &Config) -> io::Result<Self> {
        Ok(Self {
            root: resolve_root(cfg.server.root.as_deref())?,
            index_files: cfg.routes.index_files.clone(),
        })
    }
}

/// Resolve the serving root: the configured directory when given, else the
/// parent of the executable's directory (install layout where the binary
/// lives in a subdirectory of the site root).
fn resolve_root(explicit: Option<&Path>) -> io::Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    let exe = std::env::current_exe()?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "executable has no parent directory",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::load().expect("default config should load");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.routes.index_files, vec!["index.html".to_string()]);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                root: None,
            },
            routes: RoutesConfig {
                index_files: vec!["index.html".to_string()],
            },
        };
        assert_eq!(cfg.socket_addr().unwrap().port(), 3000);
        assert!(cfg.socket_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn test_explicit_root_wins() {
        let root = resolve_root(Some(Path::new("/srv/site"))).unwrap();
        assert_eq!(root, PathBuf::from("/srv/site"));
    }

    #[test]
    fn test_default_root_is_above_exe_dir() {
        let root = resolve_root(None).unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(root, exe.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_app_state_carries_config() {
        let cfg = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                root: Some(PathBuf::from("/srv/site")),
            },
            routes: RoutesConfig {
                index_files: vec!["index.html".to_string(), "index.htm".to_string()],
            },
        };
        let state = AppState::new(&cfg).unwrap();
        assert_eq!(state.root, PathBuf::from("/srv/site"));
        assert_eq!(state.index_files.len(), 2);
    }
}
