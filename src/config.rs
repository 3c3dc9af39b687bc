//! Configuration file support for the annotation tool.
//!
//! Settings come from three layers: built-in defaults, an optional JSON file
//! (native) or localStorage entry (WASM), and `TREATMARK_*` environment
//! variables on native builds.

use serde::{Deserialize, Serialize};
use treatmark_canvas::RasterFormat;

use crate::constants::{
    DEFAULT_REDIRECT_DELAY_MS, METHOD_ANNOTATION_HISTORY, METHOD_ANNOTATION_RECORDS,
    METHOD_SAVE_ANNOTATION,
};
use crate::keybindings::KeyBindings;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Parse a level name case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Backend connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Scheme + host of the desk, e.g. `https://clinic.example.org`
    #[serde(default)]
    pub base_url: String,

    /// Value for the site-name header (the page hostname)
    #[serde(default)]
    pub site_name: Option<String>,

    /// CSRF token rendered into the page
    #[serde(default, skip_serializing)]
    pub csrf_token: Option<String>,
}

/// Names of the remote procedures the controller calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProceduresConfig {
    #[serde(default = "default_records_method")]
    pub records: String,
    #[serde(default = "default_history_method")]
    pub history: String,
    #[serde(default = "default_save_method")]
    pub save: String,
}

fn default_records_method() -> String {
    METHOD_ANNOTATION_RECORDS.to_string()
}

fn default_history_method() -> String {
    METHOD_ANNOTATION_HISTORY.to_string()
}

fn default_save_method() -> String {
    METHOD_SAVE_ANNOTATION.to_string()
}

impl Default for ProceduresConfig {
    fn default() -> Self {
        Self {
            records: default_records_method(),
            history: default_history_method(),
            save: default_save_method(),
        }
    }
}

/// Save behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Delay between the confirmation and navigating to the record
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,

    /// Format of the rendered preview sent with each save
    #[serde(default)]
    pub raster_format: RasterFormat,
}

fn default_redirect_delay_ms() -> u64 {
    DEFAULT_REDIRECT_DELAY_MS
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: default_redirect_delay_ms(),
            raster_format: RasterFormat::default(),
        }
    }
}

/// Application configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub procedures: ProceduresConfig,

    #[serde(default)]
    pub save: SaveConfig,

    #[serde(default)]
    pub keybindings: KeyBindings,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_app_name() -> String {
    "Treatmark".to_string()
}

impl AnnotatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            server: ServerConfig::default(),
            procedures: ProceduresConfig::default(),
            save: SaveConfig::default(),
            keybindings: KeyBindings::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognised keys: `TREATMARK_BASE_URL`, `TREATMARK_SITE_NAME`,
    /// `TREATMARK_CSRF_TOKEN`, `TREATMARK_LOG`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TREATMARK_BASE_URL") {
            self.server.base_url = url;
        }
        if let Some(site) = lookup("TREATMARK_SITE_NAME") {
            self.server.site_name = Some(site);
        }
        if let Some(token) = lookup("TREATMARK_CSRF_TOKEN") {
            self.server.csrf_token = Some(token);
        }
        if let Some(level) = lookup("TREATMARK_LOG") {
            self.log_level =
                LogLevel::from_name(&level).ok_or(ConfigError::InvalidValue {
                    key: "TREATMARK_LOG",
                    value: level,
                })?;
        }
        Ok(())
    }

    /// LocalStorage key for the WASM configuration.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "treatmark-config";

    /// Try to load configuration from localStorage (WASM only).
    /// Returns None if not found or can't be parsed.
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;

        match storage.get_item(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        }
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// An override carried a value that cannot be used
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::new();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.procedures.save, "annotation.api.save_annotation");
        assert_eq!(config.save.redirect_delay_ms, 1000);
        assert_eq!(config.save.raster_format, RasterFormat::Jpeg);
    }

    #[test]
    fn test_json_roundtrip_omits_csrf_token() {
        let mut config = AnnotatorConfig::new();
        config.server.base_url = "https://clinic.example.org".to_string();
        config.server.csrf_token = Some("secret".to_string());

        let json = config.to_json().unwrap();
        assert!(!json.contains("secret"));

        let back = AnnotatorConfig::from_json(&json).unwrap();
        assert_eq!(back.server.base_url, "https://clinic.example.org");
        assert_eq!(back.server.csrf_token, None);
        assert_eq!(back.keybindings, config.keybindings);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = AnnotatorConfig::from_json(r#"{"version": 1, "log_level": "debug"}"#).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.app_name, "Treatmark");
        assert_eq!(config.procedures, ProceduresConfig::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = AnnotatorConfig::from_json(r#"{"version": 99}"#);
        assert_matches!(
            result,
            Err(ConfigError::VersionTooNew {
                file_version: 99,
                ..
            })
        );
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TREATMARK_BASE_URL", "http://localhost:8000"),
            ("TREATMARK_CSRF_TOKEN", "tok"),
            ("TREATMARK_LOG", "TRACE"),
        ]
        .into_iter()
        .collect();

        let mut config = AnnotatorConfig::new();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.server.csrf_token.as_deref(), Some("tok"));
        assert_eq!(config.server.site_name, None);
        assert_eq!(config.log_level, LogLevel::Trace);
    }

    #[test]
    fn test_bad_log_override() {
        let mut config = AnnotatorConfig::new();
        let result = config.apply_overrides(|key| {
            (key == "TREATMARK_LOG").then(|| "loud".to_string())
        });
        assert_matches!(result, Err(ConfigError::InvalidValue { key: "TREATMARK_LOG", .. }));
    }
}
