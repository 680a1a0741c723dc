//! `memlens run` - run analysis commands against an evidence image.

use std::path::PathBuf;
use std::sync::Arc;

use memlens::artifact::ArtifactList;
use memlens::catalog::{CommandCatalog, CommandSpec};
use memlens::config::SettingsFile;
use memlens::dispatcher::{
    DispatcherConfig, EventSink, JobDispatcher, JobKey, JobOutcome,
};
use memlens::export::{ExportError, ExportOptions, ExportPackager, ExportReport};
use memlens::parser::{Parsed, Table};
use memlens::runner::ToolRunner;
use memlens::store::CommandResult;

use crate::error::CliError;
use crate::RunArgs;

/// Sink printing engine progress to stdout.
///
/// The engine never touches the terminal itself; this is the CLI's
/// presentation layer.
struct PrintingSink;

impl EventSink for PrintingSink {
    fn on_job_started(&self, key: &JobKey) {
        println!("running  {key}");
    }

    fn on_job_completed(&self, key: &JobKey, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Completed { .. } => println!("finished {key}"),
            JobOutcome::Failed { error } => println!("failed   {key}: {error}"),
            JobOutcome::Cancelled => println!("cancelled {key}"),
        }
    }

    fn on_export_completed(&self, result: &Result<ExportReport, ExportError>) {
        match result {
            Ok(report) => {
                println!("exported {}", report.archive.display());
                for warning in &report.warnings {
                    println!("  warning: {warning}");
                }
            }
            Err(error) => println!("export failed: {error}"),
        }
    }
}

pub async fn execute(settings: &SettingsFile, args: RunArgs) -> Result<(), CliError> {
    let catalog = CommandCatalog::load_or_builtin(&settings.catalog.path);
    let specs = resolve_specs(&catalog, &args.commands)?;

    let runner = Arc::new(ToolRunner::new(settings.tool.entry_point()));
    let events: Arc<dyn EventSink> = Arc::new(PrintingSink);
    let dispatcher = JobDispatcher::with_events(
        catalog,
        runner,
        Arc::clone(&events),
        DispatcherConfig {
            workers: settings.engine.workers,
        },
    );

    let mut artifacts = ArtifactList::new();
    artifacts.load(&args.image);

    for spec in &specs {
        if let Err(err) = dispatcher.submit(artifacts.selected(), spec, &args.params) {
            println!("skipped  {}: {err}", spec.command);
        }
    }
    dispatcher.wait_idle().await;

    let store = dispatcher.store();
    for key in store.list() {
        if let Some(result) = store.get(&key) {
            print_result(&result);
        }
    }

    if let Some(destination) = args.export.clone() {
        export_session(&dispatcher, &artifacts, destination, &args).await?;
    }

    dispatcher.shutdown();
    Ok(())
}

fn resolve_specs(
    catalog: &CommandCatalog,
    names: &[String],
) -> Result<Vec<CommandSpec>, CliError> {
    names
        .iter()
        .map(|name| {
            catalog
                .get(name)
                .cloned()
                .ok_or_else(|| CliError::UnknownCommand(name.clone()))
        })
        .collect()
}

async fn export_session(
    dispatcher: &JobDispatcher,
    artifacts: &ArtifactList,
    destination: PathBuf,
    args: &RunArgs,
) -> Result<(), CliError> {
    let artifact = artifacts
        .selected()
        .expect("artifact loaded at run start");
    let packager = ExportPackager::new(dispatcher.store(), dispatcher.events());
    let options = ExportOptions {
        include_artifact: !args.no_artifact,
        include_highlights: !args.no_highlights,
    };
    match packager.export(artifact, Some(destination), options).await {
        Some(Ok(_)) | None => Ok(()),
        Some(Err(err)) => Err(CliError::Export(err)),
    }
}

fn print_result(result: &CommandResult) {
    println!();
    println!("=== {} ===", result.key);
    match &result.parsed {
        Parsed::Table(table) => print_table(table),
        Parsed::Raw(text) => println!("{text}"),
    }
}

fn print_table(table: &Table) {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let header: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    println!("{}", header.join("  "));

    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
            .collect();
        println!("{}", cells.join("  "));
    }
}
