//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Default entry-point script of the external analysis tool.
pub const DEFAULT_TOOL_ENTRY: &str = "vol.py";

/// Default worker count for the job dispatcher.
pub const DEFAULT_WORKERS: usize = 4;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, Default)]
pub struct SettingsFile {
    /// External analysis tool settings
    pub tool: ToolSettings,
    /// Job engine settings
    pub engine: EngineSettings,
    /// Command catalog settings
    pub catalog: CatalogSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// External analysis tool configuration.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Base directory containing the tool installation.
    pub base_path: PathBuf,
    /// Entry-point file name, resolved relative to `base_path`.
    pub entry: String,
}

impl ToolSettings {
    /// Returns the full path of the tool's entry point.
    pub fn entry_point(&self) -> PathBuf {
        self.base_path.join(&self.entry)
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::new(),
            entry: DEFAULT_TOOL_ENTRY.to_string(),
        }
    }
}

/// Job engine configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Number of concurrent job workers.
    pub workers: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Command catalog configuration.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Path of the persisted command catalog.
    pub path: PathBuf,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("commands.json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Directory for log files.
    pub directory: PathBuf,
    /// Log file name.
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file: "memlens.log".to_string(),
        }
    }
}
