//! TOML-based configuration for the mirroring service.
//!
//! Reads `AppConfig` from `/etc/fbmirror/config.toml` unless `--config`
//! names another file.  A missing file is not an error: the service starts
//! with defaults, which open `/dev/fb0` and reject every viewer until
//! credentials are configured.
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format designed
//! to be easy to read and write.  It looks similar to INI files but with more
//! data types.  Example:
//!
//! ```toml
//! [server]
//! frame_rate = "fast"
//! variant = "soft-buttons"
//!
//! [devices]
//! framebuffer = "/dev/fb0"
//! rotation = 90
//!
//! [[auth.credentials]]
//! password = "secret"
//! tier = "admin"
//! ```
//!
//! The `serde` library provides automatic serialisation/deserialisation between
//! Rust structs and TOML text.  The `#[derive(Serialize, Deserialize)]` macros
//! generate all the boilerplate code at compile time.
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, so any section or
//! key may be omitted and an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fbmirror_core::input::DebounceConfig;
use fbmirror_core::{
    Credential, CredentialSet, DeviceVariant, FormatError, InjectorConfig, Rotation, TouchBounds,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/fbmirror/config.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
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

    /// The file parsed but holds a value the service cannot run with.
    #[error("invalid config value for {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// How long the service loop lets the transport run between diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameRate {
    /// 330 ms per cycle.
    #[default]
    Standard,
    /// 50 ms per cycle.
    Fast,
}

impl FrameRate {
    pub fn budget(self) -> Duration {
        match self {
            FrameRate::Standard => Duration::from_millis(330),
            FrameRate::Fast => Duration::from_millis(50),
        }
    }
}

/// General service behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub frame_rate: FrameRate,
    #[serde(default)]
    pub variant: DeviceVariant,
    /// Name announced to viewers.
    #[serde(default = "default_desktop_name")]
    pub desktop_name: String,
}

/// Listening socket settings handed to the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// IP address to listen on.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Device nodes.  An empty keyboard or touch path disables that channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DevicesConfig {
    #[serde(default = "default_framebuffer")]
    pub framebuffer: PathBuf,
    #[serde(default = "default_keyboard")]
    pub keyboard: PathBuf,
    #[serde(default = "default_touch")]
    pub touch: PathBuf,
    /// Clockwise rotation of the mirrored image in degrees.
    #[serde(default)]
    pub rotation: u32,
}

impl DevicesConfig {
    pub fn rotation(&self) -> Result<Rotation, FormatError> {
        Rotation::from_degrees(self.rotation)
    }

    pub fn keyboard_path(&self) -> Option<&Path> {
        non_empty(&self.keyboard)
    }

    pub fn touch_path(&self) -> Option<&Path> {
        non_empty(&self.touch)
    }
}

fn non_empty(path: &Path) -> Option<&Path> {
    (!path.as_os_str().is_empty()).then_some(path)
}

/// Keyboard debounce and touch tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Every Nth coalesced repeat is let through.
    #[serde(default = "default_repeat_refresh_every")]
    pub repeat_refresh_every: u32,
    /// Overrides the range queried from the touch device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch_bounds: Option<TouchBounds>,
}

impl InputConfig {
    pub fn debounce(&self) -> DebounceConfig {
        DebounceConfig {
            window: Duration::from_millis(self.debounce_ms),
            refresh_every: self.repeat_refresh_every,
        }
    }
}

/// Session limits and the password list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Maximum number of concurrently authenticated sessions.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Checked in order; the first matching password decides the tier.
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl AuthConfig {
    pub fn credential_set(&self) -> CredentialSet {
        CredentialSet::new(self.credentials.clone())
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_desktop_name() -> String {
    "fbmirror".to_string()
}
fn default_port() -> u16 {
    5900
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_framebuffer() -> PathBuf {
    PathBuf::from("/dev/fb0")
}
fn default_keyboard() -> PathBuf {
    PathBuf::from("/dev/input/kbd")
}
fn default_touch() -> PathBuf {
    PathBuf::from("/dev/input/ts")
}
fn default_debounce_ms() -> u64 {
    100
}
fn default_repeat_refresh_every() -> u32 {
    10
}
fn default_capacity() -> usize {
    fbmirror_core::domain::auth::DEFAULT_CAPACITY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            frame_rate: FrameRate::default(),
            variant: DeviceVariant::default(),
            desktop_name: default_desktop_name(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            framebuffer: default_framebuffer(),
            keyboard: default_keyboard(),
            touch: default_touch(),
            rotation: 0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            repeat_refresh_every: default_repeat_refresh_every(),
            touch_bounds: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            credentials: Vec::new(),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Rejects values the service cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.devices.rotation().map_err(|e| ConfigError::Validation {
            field: "devices.rotation",
            reason: e.to_string(),
        })?;
        if self.input.debounce_ms == 0 {
            return Err(invalid("input.debounce_ms", "must be greater than zero"));
        }
        if self.input.repeat_refresh_every == 0 {
            return Err(invalid("input.repeat_refresh_every", "must be greater than zero"));
        }
        if let Some(b) = self.input.touch_bounds {
            if b.min_x > b.max_x || b.min_y > b.max_y {
                return Err(invalid("input.touch_bounds", "minimum exceeds maximum"));
            }
        }
        if self.auth.capacity == 0 {
            return Err(invalid("auth.capacity", "must be greater than zero"));
        }
        Ok(())
    }

    /// Builds the injector tuning, using `device_bounds` unless the file
    /// overrides the touch rectangle.
    pub fn injector_config(&self, device_bounds: TouchBounds) -> InjectorConfig {
        InjectorConfig {
            debounce: self.input.debounce(),
            touch_bounds: self.input.touch_bounds.unwrap_or(device_bounds),
            variant: self.server.variant,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field,
        reason: reason.to_string(),
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path` as pretty TOML, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
