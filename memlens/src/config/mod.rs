//! Configuration for the MemLens workbench.
//!
//! Settings live in an INI file (`~/.memlens/config.ini` by default) with
//! one section per concern:
//!
//! ```ini
//! [tool]
//! base_path = /opt/volatility3
//! entry = vol.py
//!
//! [engine]
//! workers = 4
//!
//! [catalog]
//! path = commands.json
//!
//! [logging]
//! directory = logs
//! file = memlens.log
//! ```
//!
//! Settings structs live in [`settings`]; file handling and parsing in
//! [`file`].

mod file;
mod settings;

pub use file::{config_file_path, ConfigFileError};
pub use settings::{
    CatalogSettings, EngineSettings, LoggingSettings, SettingsFile, ToolSettings,
    DEFAULT_TOOL_ENTRY, DEFAULT_WORKERS,
};
