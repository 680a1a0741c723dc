//! MemLens - Memory forensics analysis workbench engine
//!
//! This library provides the core engine behind the MemLens workbench:
//! concurrent dispatch of external analysis commands against loaded evidence
//! artifacts, parsing of tool output into structured tables, an annotation
//! overlay on results, and packaging of a session into a portable archive.
//!
//! # High-Level API
//!
//! ```ignore
//! use memlens::catalog::CommandCatalog;
//! use memlens::config::SettingsFile;
//! use memlens::dispatcher::{DispatcherConfig, JobDispatcher};
//! use memlens::runner::ToolRunner;
//! use std::sync::Arc;
//!
//! let settings = SettingsFile::load_from(path)?;
//! let catalog = CommandCatalog::load_or_builtin(&settings.catalog.path);
//! let runner = Arc::new(ToolRunner::new(settings.tool.entry_point()));
//!
//! let dispatcher = JobDispatcher::new(catalog, runner, DispatcherConfig::default());
//! let handle = dispatcher.submit(artifacts.selected(), &spec, "")?;
//! dispatcher.wait_idle().await;
//! ```
//!
//! Presentation layers (GUI, CLI) consume the engine exclusively through the
//! [`dispatcher::EventSink`] callback interface and never receive direct
//! widget mutations from the engine.

pub mod annotate;
pub mod artifact;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod export;
pub mod logging;
pub mod parser;
pub mod runner;
pub mod store;

/// Version of the MemLens library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
