//! User preferences: TOML file in the platform config directory.
//!
//! The file only holds defaults for the command line; nothing read from a
//! scanner is ever stored here.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# rfidscan configuration. Command-line options override these values.\n\n";

/// Buzzer duration used when `beep` is given no `--during`.
pub const DEFAULT_BEEP_MS: u16 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Buzzer duration in milliseconds. Default: 30.
    #[serde(default = "default_beep_ms")]
    pub beep_ms: u16,

    /// Password for protected readers, as 4 hex digits. Empty = none.
    #[serde(default)]
    pub password: String,

    /// Preferred reader serial number. Empty = every attached reader.
    #[serde(default)]
    pub device_serial: String,

    /// Apply the new configuration after each successful command, as if
    /// `--reset` had been given.
    #[serde(default)]
    pub apply_after_write: bool,
}

fn default_beep_ms() -> u16 {
    DEFAULT_BEEP_MS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            beep_ms: DEFAULT_BEEP_MS,
            password: String::new(),
            device_serial: String::new(),
            apply_after_write: false,
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `password` is neither empty nor 4 hex digits.
    InvalidPassword(String),
    ZeroBeepDuration,
    /// `device_serial` contains characters a USB serial never has.
    InvalidSerial(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPassword(e) => write!(f, "Invalid password: {e}"),
            ValidationError::ZeroBeepDuration => write!(f, "beep_ms must be greater than 0"),
            ValidationError::InvalidSerial(s) => write!(f, "Invalid device_serial: {s:?}"),
        }
    }
}

/// Parse a 4-hex-digit password into the two bytes the reader stores.
pub fn parse_password(s: &str) -> crate::error::Result<[u8; 2]> {
    let s = s.trim();
    let bad = || crate::RfidscanError::Config(format!("password must be 4 hex digits, got {s:?}"));
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let value = u16::from_str_radix(s, 16).map_err(|_| bad())?;
    Ok(value.to_be_bytes())
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rfidscan"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Password bytes, or `None` when no password is configured.
    pub fn password_bytes(&self) -> crate::error::Result<Option<[u8; 2]>> {
        if self.password.trim().is_empty() {
            return Ok(None);
        }
        parse_password(&self.password).map(Some)
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.password_bytes() {
            errors.push(ValidationError::InvalidPassword(e.to_string()));
        }

        if self.beep_ms == 0 {
            errors.push(ValidationError::ZeroBeepDuration);
        }

        let serial = self.device_serial.trim();
        if !serial.bytes().all(|b| b.is_ascii_alphanumeric()) {
            errors.push(ValidationError::InvalidSerial(serial.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
