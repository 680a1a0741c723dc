//! The persisted command catalog.
//!
//! The catalog is a JSON document (`commands.json`) listing every analysis
//! command the workbench can dispatch: built-in tool plugins plus any custom
//! plugins the analyst registered. Custom entries record only the sanitized
//! base name of the chosen script - the engine never executes plugin code
//! itself, it stores a command identifier that is later invoked through the
//! same tool contract as the built-ins.
//!
//! The catalog is an explicit value injected into the dispatcher at
//! construction; reloading from disk is an explicit [`CommandCatalog::reload`]
//! call, never ambient file access.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Catalog load/save errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read command catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Catalog file is not valid JSON.
    #[error("failed to parse command catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Catalog file could not be written.
    #[error("failed to write command catalog {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A custom plugin with the same command name already exists.
    #[error("plugin '{0}' already exists in the catalog")]
    DuplicatePlugin(String),

    /// The selected plugin script path has no usable file name.
    #[error("cannot derive a plugin name from '{0}'")]
    InvalidPluginPath(PathBuf),
}

/// Kind of catalog entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    /// Shipped with the analysis tool.
    #[serde(rename = "Built-in")]
    BuiltIn,
    /// Registered by the analyst from a script file.
    #[serde(rename = "Custom Plugin")]
    CustomPlugin,
}

/// One analysis command the workbench can dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Entry kind (built-in or custom plugin).
    #[serde(rename = "type")]
    pub kind: CommandKind,
    /// Command name passed verbatim to the external tool.
    pub command: String,
    /// Human-readable description shown in the command picker.
    pub description: String,
    /// Optional parameter template suggested when submitting the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
}

impl CommandSpec {
    /// Creates a built-in command entry.
    pub fn builtin(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::BuiltIn,
            command: command.into(),
            description: description.into(),
            parameters: None,
        }
    }
}

/// The command catalog: entries plus the path they persist to.
#[derive(Clone, Debug)]
pub struct CommandCatalog {
    entries: Vec<CommandSpec>,
    path: PathBuf,
}

impl CommandCatalog {
    /// Loads the catalog from `path`.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        let entries = serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { entries, path })
    }

    /// Loads the catalog from `path`, falling back to the built-in command
    /// set when the file is missing or unreadable.
    pub fn load_or_builtin(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load_from(&path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Falling back to built-in catalog");
                Self::builtin(path)
            }
        }
    }

    /// Returns the built-in command set, persisted to `path` on first save.
    pub fn builtin(path: impl Into<PathBuf>) -> Self {
        let entries = vec![
            CommandSpec::builtin("windows.pslist", "List the processes present in a memory image"),
            CommandSpec::builtin("windows.psscan", "Scan for processes, including hidden or terminated ones"),
            CommandSpec::builtin("windows.netscan", "Scan for network connections and sockets"),
            CommandSpec::builtin("windows.dlllist", "List the loaded modules of each process"),
            CommandSpec::builtin("windows.cmdline", "Display process command-line arguments"),
            CommandSpec::builtin("windows.malfind", "Find hidden and injected code regions"),
            CommandSpec::builtin("windows.handles", "List open handles held by each process"),
            CommandSpec::builtin("windows.filescan", "Scan for file objects in the memory image"),
        ];
        Self {
            entries,
            path: path.into(),
        }
    }

    /// Re-reads the catalog from its backing file, replacing the in-memory
    /// entries. Custom entries saved earlier survive since saves rewrite the
    /// same file.
    pub fn reload(&mut self) -> Result<(), CatalogError> {
        let fresh = Self::load_from(&self.path)?;
        self.entries = fresh.entries;
        Ok(())
    }

    /// Persists the catalog to its backing file.
    pub fn save(&self) -> Result<(), CatalogError> {
        let text = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            CatalogError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, text).map_err(|source| CatalogError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Registers a custom plugin from a script file.
    ///
    /// Only the sanitized base name is recorded (a `.py` suffix is dropped,
    /// matching the tool's plugin naming); duplicates are rejected rather
    /// than silently replaced. The catalog is saved after a successful
    /// append so custom entries are never lost.
    pub fn add_custom_plugin(&mut self, script: &Path) -> Result<&CommandSpec, CatalogError> {
        let name = script
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CatalogError::InvalidPluginPath(script.to_path_buf()))?;

        if self.entries.iter().any(|e| e.command == name) {
            return Err(CatalogError::DuplicatePlugin(name));
        }

        let description = format!("This is your custom plugin {name}");
        self.entries.push(CommandSpec {
            kind: CommandKind::CustomPlugin,
            command: name.clone(),
            description,
            parameters: None,
        });
        self.save()?;
        info!(plugin = %name, "Registered custom plugin");
        Ok(self.entries.last().expect("entry just appended"))
    }

    /// Looks up a command by name.
    pub fn get(&self, command: &str) -> Option<&CommandSpec> {
        self.entries.iter().find(|e| e.command == command)
    }

    /// Returns all catalog entries in catalog order.
    pub fn entries(&self) -> &[CommandSpec] {
        &self.entries
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrips_through_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        let catalog = CommandCatalog::builtin(&path);
        catalog.save().unwrap();

        let loaded = CommandCatalog::load_from(&path).unwrap();
        assert_eq!(loaded.entries(), catalog.entries());
        assert!(loaded.get("windows.pslist").is_some());
    }

    #[test]
    fn custom_plugin_drops_extension_and_rejects_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        let mut catalog = CommandCatalog::builtin(&path);

        let spec = catalog
            .add_custom_plugin(Path::new("/plugins/yarascan_custom.py"))
            .unwrap();
        assert_eq!(spec.command, "yarascan_custom");
        assert_eq!(spec.kind, CommandKind::CustomPlugin);

        let err = catalog
            .add_custom_plugin(Path::new("/elsewhere/yarascan_custom.py"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePlugin(name) if name == "yarascan_custom"));
    }

    #[test]
    fn reload_picks_up_saved_plugins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("commands.json");
        let mut catalog = CommandCatalog::builtin(&path);
        catalog.add_custom_plugin(Path::new("memtriage.py")).unwrap();

        let mut other = CommandCatalog::builtin(&path);
        other.reload().unwrap();
        assert!(other.get("memtriage").is_some());
    }

    #[test]
    fn missing_file_falls_back_to_builtins() {
        let dir = tempdir().unwrap();
        let catalog = CommandCatalog::load_or_builtin(dir.path().join("absent.json"));
        assert!(!catalog.entries().is_empty());
    }
}
