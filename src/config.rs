//! Application configuration loaded from environment variables.

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interface the listener binds to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Grace period for draining in-flight requests on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    // === System Configuration ===
    /// Version reported by the status endpoint.
    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Providers to register at startup (comma-separated).
    #[serde(default)]
    pub providers: Vec<String>,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            app_version: default_app_version(),
            providers: Vec::new(),
            rust_log: default_log_level(),
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.shutdown_timeout_secs == 0 {
            return Err("SHUTDOWN_TIMEOUT_SECS must be greater than 0".to_string());
        }

        if self.app_version.trim().is_empty() {
            return Err("APP_VERSION must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for name in &self.providers {
            if name.trim().is_empty() {
                return Err("PROVIDERS must not contain empty names".to_string());
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("PROVIDERS contains duplicate name: {}", name));
            }
        }

        Ok(())
    }

    /// Shutdown grace period as a duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
