//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use memlens::catalog::CatalogError;
use memlens::export::ExportError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Catalog load/save error
    Catalog(CatalogError),
    /// A requested command is not in the catalog
    UnknownCommand(String),
    /// Export failed
    Export(ExportError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::UnknownCommand(_) => {
                eprintln!();
                eprintln!("Run 'memlens commands' to list the available catalog.");
            }
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check [tool] base_path in the config file: it must point");
                eprintln!("at the analysis tool installation directory.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Catalog(err) => write!(f, "Catalog error: {}", err),
            CliError::UnknownCommand(name) => {
                write!(f, "Command '{}' is not in the catalog", name)
            }
            CliError::Export(err) => write!(f, "Export failed: {}", err),
        }
    }
}
