//! Configuration file handling for ~/.memlens/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Parsing starts
//! from [`SettingsFile::default`] and overlays any values found in the INI,
//! so a partial file is always valid.

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::SettingsFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    Write(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    Directory(std::io::Error),
}

/// Returns the default config file path (~/.memlens/config.ini).
pub fn config_file_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".memlens").join("config.ini")
}

impl SettingsFile {
    /// Load configuration from the default path (~/.memlens/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::Directory)?;
        }
        write_ini(self)
            .write_to_file(path)
            .map_err(|e| ConfigFileError::Write(e.to_string()))
    }
}

/// Parse an `Ini` object into a `SettingsFile`.
fn parse_ini(ini: &Ini) -> Result<SettingsFile, ConfigFileError> {
    let mut config = SettingsFile::default();

    // [tool] section
    if let Some(section) = ini.section(Some("tool")) {
        if let Some(v) = section.get("base_path") {
            let v = v.trim();
            if !v.is_empty() {
                config.tool.base_path = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("entry") {
            let v = v.trim();
            if !v.is_empty() {
                config.tool.entry = v.to_string();
            }
        }
    }

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = section.get("workers") {
            let workers: usize = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "engine".to_string(),
                key: "workers".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer".to_string(),
            })?;
            if workers == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "workers".to_string(),
                    value: v.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.engine.workers = workers;
        }
    }

    // [catalog] section
    if let Some(section) = ini.section(Some("catalog")) {
        if let Some(v) = section.get("path") {
            let v = v.trim();
            if !v.is_empty() {
                config.catalog.path = PathBuf::from(v);
            }
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = PathBuf::from(v);
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

/// Serialize a `SettingsFile` into an `Ini` object.
fn write_ini(config: &SettingsFile) -> Ini {
    let mut ini = Ini::new();
    ini.with_section(Some("tool"))
        .set("base_path", config.tool.base_path.display().to_string())
        .set("entry", config.tool.entry.clone());
    ini.with_section(Some("engine"))
        .set("workers", config.engine.workers.to_string());
    ini.with_section(Some("catalog"))
        .set("path", config.catalog.path.display().to_string());
    ini.with_section(Some("logging"))
        .set("directory", config.logging.directory.display().to_string())
        .set("file", config.logging.file.clone());
    ini
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::DEFAULT_WORKERS;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = SettingsFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config.engine.workers, DEFAULT_WORKERS);
        assert_eq!(config.tool.entry, "vol.py");
    }

    #[test]
    fn roundtrips_through_ini() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let mut config = SettingsFile::default();
        config.tool.base_path = PathBuf::from("/opt/volatility3");
        config.engine.workers = 8;
        config.save_to(&path).unwrap();

        let loaded = SettingsFile::load_from(&path).unwrap();
        assert_eq!(loaded.tool.base_path, PathBuf::from("/opt/volatility3"));
        assert_eq!(
            loaded.tool.entry_point(),
            PathBuf::from("/opt/volatility3/vol.py")
        );
        assert_eq!(loaded.engine.workers, 8);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[engine]\nworkers = 0\n").unwrap();

        let err = SettingsFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue { .. }));
    }
}
