use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{COMMON_BAUD_RATES, DEFAULT_BAUD_RATE};
use crate::io::serial::LineSettings;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppSettings {
    /// Rates offered in the baud menu, in display order
    #[serde(default = "default_baud_rates")]
    pub baud_rates: Vec<u32>,
    /// Fallback when the menu selection or custom rate is invalid
    #[serde(default = "default_baud_rate")]
    pub default_baud_rate: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Data bits, parity and stop bits used to open the port
    #[serde(default)]
    pub line: LineSettings,
    /// When set, logs are also written to a timestamped file here
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_baud_rates() -> Vec<u32> {
    COMMON_BAUD_RATES.to_vec()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    50
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            baud_rates: default_baud_rates(),
            default_baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            line: LineSettings::default(),
            log_dir: None,
        }
    }
}

impl AppSettings {
    /// Menu rates, never empty and never containing zero.
    pub fn menu_baud_rates(&self) -> Vec<u32> {
        let rates: Vec<u32> = self.baud_rates.iter().copied().filter(|r| *r > 0).collect();
        if rates.is_empty() {
            default_baud_rates()
        } else {
            rates
        }
    }

    pub fn fallback_baud_rate(&self) -> u32 {
        if self.default_baud_rate > 0 {
            self.default_baud_rate
        } else {
            DEFAULT_BAUD_RATE
        }
    }
}

/// `<config dir>/serialtap/settings.toml`
pub fn get_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("serialtap").join("settings.toml"))
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<AppSettings, String> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let settings: AppSettings = toml::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    tlog!("[settings] Loaded {}", path.display());
    Ok(settings)
}

/// Load settings from the default location.
pub fn load_settings() -> Result<AppSettings, String> {
    match get_settings_path() {
        Some(path) => load_settings_from(&path),
        None => Ok(AppSettings::default()),
    }
}
