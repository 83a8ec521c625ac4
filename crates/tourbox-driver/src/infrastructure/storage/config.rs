//! TOML-based configuration for the driver.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Linux:    `$XDG_CONFIG_HOME/tourbox/config.toml` (or `~/.config/tourbox/config.toml`)
//! - macOS:    `~/Library/Application Support/TourBox/config.toml`
//! - Windows:  `%APPDATA%\TourBox\config.toml`
//!
//! Example:
//!
//! ```toml
//! [driver]
//! profile = "/home/me/.config/tourbox/developer.json"
//! log_level = "info"
//! alternate_ticks = "dispatch"
//!
//! [serial]
//! port = "/dev/ttyACM0"
//! read_timeout_ms = 100
//!
//! [reconnect]
//! initial_delay_ms = 500
//! max_delay_ms = 10000
//! ```
//!
//! # Serde default values
//!
//! Every field carries a `#[serde(default ...)]`, so a missing file, a missing
//! section, or a missing key all fall back to the built-in defaults.  An
//! empty file is a valid config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tourbox_core::protocol::BAUD_RATE;
use tourbox_core::AlternateTickPolicy;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level driver configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// General driver behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// Profile JSON file.  Absent means the built-in profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<PathBuf>,

    /// `tracing` log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// What to do with flag-bit rotary ticks.
    #[serde(default)]
    pub alternate_ticks: AlternateTickPolicy,
}

/// Serial port settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    /// Explicit port.  Absent means auto-detect with `port_patterns`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Poll timeout of a single read; bounds how long shutdown can take.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// How long to wait for the unlock response.
    #[serde(default = "default_unlock_wait_ms")]
    pub unlock_wait_ms: u64,

    /// Port-name prefixes tried in priority order during auto-detection.
    #[serde(default = "default_port_patterns")]
    pub port_patterns: Vec<String>,
}

/// Reconnect backoff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn unlock_wait(&self) -> Duration {
        Duration::from_millis(self.unlock_wait_ms)
    }
}

impl ReconnectConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_baud_rate() -> u32 {
    BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    100
}

fn default_unlock_wait_ms() -> u64 {
    300
}

fn default_port_patterns() -> Vec<String> {
    ["tty.usbmodemTourBox", "tty.usbmodemSN", "tty.usbmodem", "ttyACM"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            profile: None,
            log_level: default_log_level(),
            alternate_ticks: AlternateTickPolicy::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            unlock_wait_ms: default_unlock_wait_ms(),
            port_patterns: default_port_patterns(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let dir = platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(dir.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path: path.to_path_buf(), source: e }),
    }
}

/// Loads the config from the platform default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Renders `config` as TOML, e.g. to seed a new config file.
pub fn to_toml(config: &AppConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Resolves the platform config directory including the `tourbox` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TourBox"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tourbox"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("TourBox"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
