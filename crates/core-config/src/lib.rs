//! Configuration loading and parsing.
//!
//! Parse `rawline.toml` (or an override path provided by the binary). Every
//! section is optional and every field has a default, so a missing or partial
//! file yields a usable configuration. Unknown fields are ignored to allow
//! forward evolution; a file that fails to parse falls back to defaults with a
//! warning rather than aborting the session.
//!
//! Values that need sanitizing (a zero fallback width, an oversized escape
//! timeout) are clamped by `Config::normalize`; the raw parsed values are kept
//! in `Config::file` for inspection.

use anyhow::Result;
use core_text::WidthModel;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "rawline.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct TerminalConfig {
    /// Columns assumed when the geometry probe fails.
    #[serde(default = "TerminalConfig::default_columns")]
    pub default_columns: u16,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            default_columns: Self::default_columns(),
        }
    }
}

impl TerminalConfig {
    const fn default_columns() -> u16 {
        80
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// How long to wait for the rest of an escape sequence after ESC.
    #[serde(default = "InputConfig::default_escape_timeout_ms")]
    pub escape_timeout_ms: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            escape_timeout_ms: Self::default_escape_timeout_ms(),
        }
    }
}

impl InputConfig {
    pub const MAX_ESCAPE_TIMEOUT_MS: u32 = 1000;

    const fn default_escape_timeout_ms() -> u32 {
        25
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TextConfig {
    #[serde(default)]
    pub width_model: WidthModel,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "DiagnosticsConfig::default_path")]
    pub path: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: Self::default_path(),
        }
    }
}

impl DiagnosticsConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("rawline.log")
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub default_columns: u16,
    pub escape_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(None, ConfigFile::default())
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("rawline").join(CONFIG_FILE_NAME);
    }
    // Final fallback relative filename.
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config::from_file(Some(content), file)),
        Err(err) => {
            warn!(target: "config", path = %path.display(), %err, "parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    fn from_file(raw: Option<String>, file: ConfigFile) -> Self {
        let mut cfg = Self {
            raw,
            file,
            default_columns: 0,
            escape_timeout: Duration::ZERO,
        };
        cfg.normalize();
        cfg
    }

    /// Recompute the effective values from `file`, clamping out-of-range input.
    pub fn normalize(&mut self) {
        let raw_columns = self.file.terminal.default_columns;
        self.default_columns = raw_columns.max(1);
        if self.default_columns != raw_columns {
            info!(target: "config", raw = raw_columns, clamped = self.default_columns, "default_columns_clamped");
        }

        let raw_timeout = self.file.input.escape_timeout_ms;
        let timeout = raw_timeout.min(InputConfig::MAX_ESCAPE_TIMEOUT_MS);
        if timeout != raw_timeout {
            info!(target: "config", raw = raw_timeout, clamped = timeout, "escape_timeout_clamped");
        }
        self.escape_timeout = Duration::from_millis(u64::from(timeout));
    }

    pub fn width_model(&self) -> WidthModel {
        self.file.text.width_model
    }

    /// Diagnostics log path when diagnostics are enabled.
    pub fn diagnostics_path(&self) -> Option<&PathBuf> {
        self.file
            .diagnostics
            .enabled
            .then_some(&self.file.diagnostics.path)
    }
}
