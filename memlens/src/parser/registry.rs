//! Registry mapping command names to table schemas.

use std::collections::HashMap;

use super::schema::{builtin_schemas, TableSchema};
use super::tabular::parse_table;
use super::Parsed;

/// Maps command names to their output schemas.
///
/// Commands without a registered schema fall back to [`Parsed::Raw`] with
/// the untouched output text.
#[derive(Clone, Debug, Default)]
pub struct ParserRegistry {
    schemas: HashMap<String, TableSchema>,
}

impl ParserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with the built-in command schemas.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for schema in builtin_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Registers a schema, replacing any previous schema for the command.
    pub fn register(&mut self, schema: TableSchema) {
        self.schemas.insert(schema.command.clone(), schema);
    }

    /// Returns the registered schema for a command, if any.
    pub fn schema(&self, command: &str) -> Option<&TableSchema> {
        self.schemas.get(command)
    }

    /// Parses raw output for the named command.
    pub fn parse(&self, command: &str, raw: &str) -> Parsed {
        match self.schemas.get(command) {
            Some(schema) => Parsed::Table(parse_table(schema, raw)),
            None => Parsed::Raw(raw.to_string()),
        }
    }
}
