//! Application settings loaded from a TOML file.
//!
//! Every key is optional; anything missing falls back to the defaults below,
//! and a missing default file means "run with defaults".

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the TOML config file
pub const CONFIG_PATH_VAR: &str = "CLASSCOUNT_CONFIG";

/// Config file used when [`CONFIG_PATH_VAR`] is not set
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Login session settings
    pub session: SessionConfig,
    /// Data created on first boot
    pub seed: SeedConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:8080"`
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Login session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minutes a session stays valid after login
    pub ttl_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_minutes: 480 }
    }
}

/// Startup seed data
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Username of the administrator created when absent
    pub admin_username: String,
    /// Initial password of that administrator
    pub admin_password: String,
    /// Classroom years created when absent
    pub classroom_years: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            classroom_years: ["1st Year", "2nd Year", "3rd Year", "4th Year"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads configuration from `$CLASSCOUNT_CONFIG`, or from `./config.toml`.
///
/// An explicitly named file must exist. The default file is optional: when it
/// is absent the built-in defaults are used.
pub fn load_app_configuration() -> Result<AppConfig> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return load_config(path);
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)
    } else {
        info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
        Ok(AppConfig::default())
    }
}
