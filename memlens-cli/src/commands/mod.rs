//! CLI subcommand implementations.

pub mod list;
pub mod plugin;
pub mod run;
