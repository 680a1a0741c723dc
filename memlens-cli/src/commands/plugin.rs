//! `memlens add-plugin` - register a custom plugin in the catalog.

use std::path::Path;

use memlens::catalog::CommandCatalog;
use memlens::config::SettingsFile;

use crate::error::CliError;

pub fn execute(settings: &SettingsFile, script: &Path) -> Result<(), CliError> {
    let mut catalog = CommandCatalog::load_or_builtin(&settings.catalog.path);
    let spec = catalog
        .add_custom_plugin(script)
        .map_err(CliError::Catalog)?;
    println!("Registered custom plugin '{}'", spec.command);
    Ok(())
}
