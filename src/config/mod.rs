//! Configuration module for the portal.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Version string injected at build time, falling back to the crate version.
pub const APP_VERSION: &str = match option_env!("APP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for the local HTTP surface
    pub api_psk: Option<String>,
    /// Path to the SQLite document store
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Hackathon year that scopes application records
    pub hackathon_year: i32,
    /// First day applications are accepted (ISO-8601)
    pub applications_open: String,
    /// Last day applications are accepted, inclusive (ISO-8601)
    pub applications_close: String,
    /// Debounce window for draft autosave
    pub draft_autosave: Duration,
    /// Idle time before an unused cache entry is collected
    pub cache_gc: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("PORTAL_API_PSK").ok();

        let db_path = env::var("PORTAL_DB_PATH")
            .unwrap_or_else(|_| "./data/portal.sqlite".to_string())
            .into();

        let bind_addr = env::var("PORTAL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid PORTAL_BIND_ADDR format");

        let log_level = env::var("PORTAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let hackathon_year = env::var("PORTAL_HACKATHON_YEAR")
            .unwrap_or_else(|_| "2025".to_string())
            .parse()
            .expect("Invalid PORTAL_HACKATHON_YEAR format");

        let applications_open =
            env::var("PORTAL_APPLICATIONS_OPEN").unwrap_or_else(|_| "2025-01-01".to_string());
        let applications_close =
            env::var("PORTAL_APPLICATIONS_CLOSE").unwrap_or_else(|_| "2025-12-31".to_string());

        let draft_autosave = Duration::from_millis(
            env::var("PORTAL_DRAFT_AUTOSAVE_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("Invalid PORTAL_DRAFT_AUTOSAVE_MS format"),
        );

        let cache_gc = Duration::from_secs(
            env::var("PORTAL_CACHE_GC_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid PORTAL_CACHE_GC_SECS format"),
        );

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            hackathon_year,
            applications_open,
            applications_close,
            draft_autosave,
            cache_gc,
        }
    }
}
