//! Runtime settings for both binaries.
//!
//! With no environment set, both servers run with the built-in defaults
//! (API on `127.0.0.1:5000` reading `model.onnx` / `scaler.onnx`, site on
//! `127.0.0.1:5001` writing to `static/uploads`). The overrides are opt-in:
//!
//! | variable         | field                     |
//! |------------------|---------------------------|
//! | `DS_API_BIND`    | [`ApiConfig::bind`]        |
//! | `DS_MODEL_PATH`  | [`ApiConfig::model_path`]  |
//! | `DS_SCALER_PATH` | [`ApiConfig::scaler_path`] |
//! | `DS_MODEL_NAME`  | [`ApiConfig::model_name`]  |
//! | `DS_SITE_BIND`   | [`SiteConfig::bind`]       |
//! | `DS_UPLOAD_DIR`  | [`SiteConfig::upload_dir`] |
//!
//! Empty values are treated as unset; an unparsable bind address falls back
//! to the default with a warning.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

const DEFAULT_API_BIND: &str = "127.0.0.1:5000";
const DEFAULT_SITE_BIND: &str = "127.0.0.1:5001";

/// Settings for the prediction API.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    /// Shown in the positive prediction message.
    pub model_name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: parse_addr(DEFAULT_API_BIND),
            model_path: PathBuf::from("model.onnx"),
            scaler_path: PathBuf::from("scaler.onnx"),
            model_name: "KNN".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: addr_or("DS_API_BIND", defaults.bind),
            model_path: env_path_or("DS_MODEL_PATH", defaults.model_path),
            scaler_path: env_path_or("DS_SCALER_PATH", defaults.scaler_path),
            model_name: env::var("DS_MODEL_NAME")
                .ok()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.model_name),
        }
    }
}

/// Settings for the static site.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub bind: SocketAddr,
    pub upload_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            bind: parse_addr(DEFAULT_SITE_BIND),
            upload_dir: PathBuf::from("static").join("uploads"),
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: addr_or("DS_SITE_BIND", defaults.bind),
            upload_dir: env_path_or("DS_UPLOAD_DIR", defaults.upload_dir),
        }
    }
}

fn parse_addr(raw: &str) -> SocketAddr {
    raw.parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 5000)))
}

fn addr_or(key: &str, default: SocketAddr) -> SocketAddr {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(addr) => addr,
            Err(err) => {
                warn!(key, value = %raw, error = %err, "ignoring unparsable bind address");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_path_or(key: &str, default: PathBuf) -> PathBuf {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}
