// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use config::{Config as ConfigFile, File, Environment};

use crate::navigation::CommonRoutes;

/// Central configuration for the console gateway
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_addr: String,
    pub log_level: String,
    /// Backend is in read-only maintenance mode; surfaced as a warning only
    pub read_only: bool,

    pub backend: BackendConfig,
    pub routes: RoutesConfig,
    pub session: SessionConfig,

    // Static file serving configuration
    pub static_files: StaticFilesConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Name of the backend's session cookie forwarded on every call
    pub session_cookie: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Where signed-in users land and where denied project routes send them
    pub default_landing: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_secs: i64,
    pub cleanup_interval_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub path: String,
    pub index: String,
    pub enable_compression: bool,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_age: u32,
    pub immutable: bool,
    pub must_revalidate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8081".to_string(),
            log_level: "info".to_string(),
            read_only: false,
            backend: BackendConfig::default(),
            routes: RoutesConfig::default(),
            session: SessionConfig::default(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            session_cookie: "sid".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            default_landing: CommonRoutes::HARBOR_DEFAULT.to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 1800,
            cleanup_interval_secs: 300,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            path: "./static".to_string(),
            index: "index.html".to_string(),
            enable_compression: true,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age: 0,
            immutable: false,
            must_revalidate: true,
        }
    }
}

impl CacheConfig {
    /// Render as a `Cache-Control` header value.
    pub fn header_value(&self) -> String {
        let mut parts = vec![format!("max-age={}", self.max_age)];
        if self.immutable {
            parts.push("immutable".to_string());
        }
        if self.must_revalidate {
            parts.push("must-revalidate".to_string());
        }
        parts.join(", ")
    }
}

/// How the running configuration was assembled.
///
/// Configuration is read before tracing is installed, so the loader reports
/// its origin instead of logging it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Files { dir: PathBuf, run_mode: String },
    /// File loading failed; built from the flat environment variables
    Environment { reason: String },
}

impl ConfigOrigin {
    /// Log the origin; call once the subscriber is set.
    pub fn log(&self) {
        match self {
            ConfigOrigin::Files { dir, run_mode } => {
                tracing::info!("Loading configuration from {}", dir.display());
                tracing::info!("Using run mode: {}", run_mode);
                tracing::info!("Configuration loaded from files and environment");
            },
            ConfigOrigin::Environment { reason } => {
                tracing::warn!("Failed to load configuration from files: {}", reason);
                tracing::info!("Falling back to environment variables only");
            }
        }
    }
}

impl Config {
    /// Get the run mode, defaulting to "development"
    pub fn run_mode() -> String {
        env::var("RUN_MODE").unwrap_or_else(|_| "development".into())
    }

    /// Locate the config directory
    pub fn config_dir() -> PathBuf {
        env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            })
    }

    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(&Self::config_dir(), &Self::run_mode())
    }

    pub fn load_from(config_dir: &Path, run_mode: &str) -> Result<Self, config::ConfigError> {
        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Environment variables such as APP__BACKEND__BASE_URL
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to the flat environment variables
    pub fn from_env() -> (Self, ConfigOrigin) {
        let dir = Self::config_dir();
        let run_mode = Self::run_mode();
        match Self::load_from(&dir, &run_mode) {
            Ok(config) => (config, ConfigOrigin::Files { dir, run_mode }),
            Err(e) => (
                Self::from_flat_env(),
                ConfigOrigin::Environment { reason: e.to_string() },
            ),
        }
    }

    fn from_flat_env() -> Self {
        let defaults = Self::default();

        let server_addr = env::var("SERVER_ADDR").unwrap_or(defaults.server_addr);
        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);
        let read_only = env::var("READ_ONLY")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.read_only);

        let base_url = env::var("BACKEND_URL").unwrap_or(defaults.backend.base_url);
        let session_cookie = env::var("BACKEND_SESSION_COOKIE")
            .unwrap_or(defaults.backend.session_cookie);
        let timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.backend.timeout_secs);

        let default_landing = env::var("DEFAULT_LANDING_ROUTE")
            .unwrap_or(defaults.routes.default_landing);

        let static_files_path = env::var("STATIC_FILES_PATH").unwrap_or(defaults.static_files.path);
        let enable_compression = env::var("ENABLE_COMPRESSION")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.static_files.enable_compression);

        Self {
            server_addr,
            log_level,
            read_only,
            backend: BackendConfig {
                base_url,
                session_cookie,
                timeout_secs,
            },
            routes: RoutesConfig { default_landing },
            session: defaults.session,
            static_files: StaticFilesConfig {
                path: static_files_path,
                enable_compression,
                ..defaults.static_files
            },
        }
    }
}
