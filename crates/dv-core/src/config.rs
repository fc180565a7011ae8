//! Site configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) yields a working site.

use std::path::Path;

use dv_common::{Error, Result, DEFAULT_PLACEHOLDER};
use dv_render::RenderConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Columns that always link to the subject's own detail page.
pub const DEFAULT_AUTOLINK_COLUMNS: &[&str] = &["id", "legal_name"];

/// Default number of rows a table shows.
pub const DEFAULT_TABLE_LIMIT: usize = 10;

/// Top-level configuration for a detail site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// First URL path segment of every detail route.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Field paths that link to the subject's detail page.
    #[serde(default = "default_autolink_columns")]
    pub autolink_columns: Vec<String>,
    /// Row limit for tables that do not set one. `0` means unbounded.
    #[serde(default = "default_table_limit")]
    pub default_table_limit: usize,
    #[serde(default = "default_placeholder")]
    pub default_placeholder: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

fn default_namespace() -> String {
    "admin".to_string()
}

fn default_autolink_columns() -> Vec<String> {
    DEFAULT_AUTOLINK_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_table_limit() -> usize {
    DEFAULT_TABLE_LIMIT
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            namespace: default_namespace(),
            display: DisplayConfig::default(),
            autolink_columns: default_autolink_columns(),
            default_table_limit: default_table_limit(),
            default_placeholder: default_placeholder(),
            server: ServerConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// How dates, times and empty values are shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    /// Offset of the display time zone, in minutes east of UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// `chrono` format string for date-times.
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
    /// `chrono` format string for dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Shown for absent values.
    #[serde(default = "default_empty_value")]
    pub empty_value: String,
}

fn default_datetime_format() -> String {
    "%d/%m/%Y %H:%M %:z".to_string()
}

fn default_date_format() -> String {
    "%m/%d/%Y".to_string()
}

fn default_empty_value() -> String {
    "-".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            utc_offset_minutes: 0,
            datetime_format: default_datetime_format(),
            date_format: default_date_format(),
            empty_value: default_empty_value(),
        }
    }
}

/// Listener settings for `dv serve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl SiteConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), namespace = %config.namespace, "config loaded");
        Ok(config)
    }

    /// Load `path` if given, else the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                debug!("no config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Row limit as the builder expects it: `None` is unbounded.
    pub fn table_limit(&self) -> Option<usize> {
        match self.default_table_limit {
            0 => None,
            n => Some(n),
        }
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty()
            || !self
                .namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "namespace '{}' must be a non-empty path segment",
                self.namespace
            )));
        }
        // Offsets beyond +/-24h are rejected by chrono.
        if self.display.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(Error::Config(format!(
                "display.utc_offset_minutes {} is out of range",
                self.display.utc_offset_minutes
            )));
        }
        if self.display.datetime_format.is_empty() || self.display.date_format.is_empty() {
            return Err(Error::Config(
                "display formats must not be empty".to_string(),
            ));
        }
        if self.autolink_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config(
                "autolink_columns must not contain empty names".to_string(),
            ));
        }
        if self.server.bind.is_empty() {
            return Err(Error::Config("server.bind must not be empty".to_string()));
        }
        Ok(())
    }
}
