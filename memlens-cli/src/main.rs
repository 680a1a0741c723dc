//! MemLens CLI - Command-line interface
//!
//! This binary provides a command-line front end to the MemLens engine:
//! it lists the command catalog, registers custom plugins, and runs
//! analysis commands against an evidence image, optionally exporting the
//! session as a portable archive.

use clap::{Args, Parser, Subcommand};
use memlens::config::SettingsFile;
use memlens::logging::init_logging;
use std::path::PathBuf;

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "memlens")]
#[command(about = "Memory forensics analysis workbench", long_about = None)]
#[command(version = memlens::VERSION)]
struct Cli {
    /// Config file path (defaults to ~/.memlens/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// List the command catalog
    Commands,

    /// Register a custom plugin script in the catalog
    AddPlugin {
        /// Plugin script file; only its sanitized base name is recorded
        script: PathBuf,
    },

    /// Run analysis commands against an evidence image
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Evidence image to analyze
    #[arg(long)]
    image: PathBuf,

    /// Command name to run (repeatable)
    #[arg(short = 'c', long = "command", required = true)]
    commands: Vec<String>,

    /// Extra parameters passed to each command
    #[arg(long, default_value = "")]
    params: String,

    /// Export the session to a zip at this path after the run
    #[arg(long)]
    export: Option<PathBuf>,

    /// Exclude the evidence copy from the export
    #[arg(long)]
    no_artifact: bool,

    /// Exclude highlight metadata from the export
    #[arg(long)]
    no_highlights: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => err.exit(),
    };

    let _logging_guard =
        match init_logging(&settings.logging.directory, &settings.logging.file) {
            Ok(guard) => guard,
            Err(err) => CliError::LoggingInit(err.to_string()).exit(),
        };

    let result = match cli.command {
        CliCommand::Commands => commands::list::execute(&settings),
        CliCommand::AddPlugin { script } => commands::plugin::execute(&settings, &script),
        CliCommand::Run(args) => commands::run::execute(&settings, args).await,
    };

    if let Err(err) = result {
        err.exit();
    }
}

fn load_settings(path: Option<&std::path::Path>) -> Result<SettingsFile, CliError> {
    let result = match path {
        Some(path) => SettingsFile::load_from(path),
        None => SettingsFile::load(),
    };
    result.map_err(|e| CliError::Config(e.to_string()))
}
