//! Database definitions.

use std::sync::Arc;

use super::prefix::lookup_unique_prefix;
use super::table::Table;

/// A logical database: a named set of tables plus its sequences.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    name_lower: String,
    /// Sorted by lowercase table name
    tables: Vec<Arc<Table>>,
    sequences: Vec<String>,
}

impl Database {
    /// Creates an empty database.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name_lower: name.to_lowercase(),
            name,
            tables: Vec::new(),
            sequences: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_lower(&self) -> &str {
        &self.name_lower
    }

    /// Adds a table, keeping the table list sorted by name.
    ///
    /// A table whose name is already present (ignoring case) is not added.
    ///
    /// # Returns
    /// `true` if the table was added.
    pub fn add_table(&mut self, table: Table) -> bool {
        match self
            .tables
            .binary_search_by(|t| t.name_lower().cmp(table.name_lower()))
        {
            Ok(_) => false,
            Err(pos) => {
                self.tables.insert(pos, Arc::new(table));
                true
            }
        }
    }

    pub fn add_sequence(&mut self, name: impl Into<String>) {
        self.sequences.push(name.into());
    }

    /// Looks up a table by full name or unique abbreviation.
    pub fn lookup_table(&self, name: &str) -> Option<&Arc<Table>> {
        lookup_unique_prefix(&self.tables, name, |t| t.name_lower())
    }

    /// Tables sorted by case-insensitive name.
    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }
}
