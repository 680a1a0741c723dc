//! `memlens commands` - print the command catalog.

use memlens::catalog::{CommandCatalog, CommandKind};
use memlens::config::SettingsFile;

use crate::error::CliError;

pub fn execute(settings: &SettingsFile) -> Result<(), CliError> {
    let catalog = CommandCatalog::load_or_builtin(&settings.catalog.path);

    let width = catalog
        .entries()
        .iter()
        .map(|e| e.command.len())
        .max()
        .unwrap_or(0);

    for entry in catalog.entries() {
        let kind = match entry.kind {
            CommandKind::BuiltIn => "built-in",
            CommandKind::CustomPlugin => "plugin",
        };
        println!(
            "{:width$}  [{kind}]  {}",
            entry.command,
            entry.description,
            width = width
        );
    }
    Ok(())
}
