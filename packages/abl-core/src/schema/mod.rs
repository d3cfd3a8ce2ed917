//! Schema registry: databases, tables, fields and indexes with alias and
//! abbreviation-aware lookup.

pub mod database;
pub mod field;
pub mod index;
pub mod loader;
pub mod meta;
pub(crate) mod prefix;
pub mod table;


use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;

pub use database::Database;
pub use field::{Field, FieldName};
pub use index::{Index, IndexField};
pub use table::{StoreType, Table, TableName};

use crate::error::Result;
use prefix::lookup_unique_prefix;

/// Name-resolution registry over one or more databases.
///
/// Databases and tables are fixed once loading completes. Aliases can be
/// created and deleted at any time through a shared reference; each lookup
/// sees a consistent alias snapshot.
#[derive(Debug, Default)]
pub struct Schema {
    /// Sorted by lowercase database name
    databases: Vec<Arc<Database>>,
    /// Every table of every database, sorted by (table, database) name
    all_tables: Vec<Arc<Table>>,
    /// Lowercase alias -> database name
    aliases: ArcSwap<HashMap<String, String>>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads one database per description file.
    ///
    /// # Arguments
    /// * `files` - Schema description files; each database is named after its file stem
    /// * `inject_meta` - Whether to add the built-in dictionary tables to every database
    pub fn load_files<P: AsRef<Path>>(files: &[P], inject_meta: bool) -> Result<Self> {
        let mut schema = Self::new();
        for file in files {
            schema.add_database(loader::load_file(file.as_ref())?);
        }
        if inject_meta {
            schema.inject_meta_schema()?;
        }
        Ok(schema)
    }

    /// Registers a database. A database with the same name replaces the earlier one.
    pub fn add_database(&mut self, db: Database) {
        let db = Arc::new(db);
        match self
            .databases
            .binary_search_by(|d| d.name_lower().cmp(db.name_lower()))
        {
            Ok(pos) => self.databases[pos] = db,
            Err(pos) => self.databases.insert(pos, db),
        }
        self.rebuild_all_tables();
    }

    /// Adds the built-in dictionary tables to every registered database.
    pub fn inject_meta_schema(&mut self) -> Result<()> {
        for db in &mut self.databases {
            meta::inject_meta_schema(Arc::make_mut(db))?;
        }
        self.rebuild_all_tables();
        Ok(())
    }

    fn rebuild_all_tables(&mut self) {
        let mut all: Vec<Arc<Table>> = self
            .databases
            .iter()
            .flat_map(|db| db.tables().iter().cloned())
            .collect();
        all.sort_by(|a, b| {
            a.name_lower()
                .cmp(b.name_lower())
                .then_with(|| a.database().to_lowercase().cmp(&b.database().to_lowercase()))
        });
        self.all_tables = all;
    }

    /// Databases sorted by name.
    pub fn databases(&self) -> &[Arc<Database>] {
        &self.databases
    }

    /// All tables sorted by table name, then database name.
    pub fn all_tables(&self) -> &[Arc<Table>] {
        &self.all_tables
    }

    /// Creates or replaces a database alias.
    ///
    /// An alias for a database that is not registered is still created, and
    /// lookups through it fail until such a database exists.
    pub fn create_alias(&self, alias: &str, db_name: &str) {
        if self.lookup_database_direct(db_name).is_none() {
            tracing::error!("Creating alias {} for unknown database {}", alias, db_name);
        }
        let key = alias.to_lowercase();
        let value = db_name.to_string();
        self.aliases.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), value.clone());
            next
        });
    }

    /// Deletes one alias, or all aliases when `alias` is `None` or empty.
    pub fn delete_alias(&self, alias: Option<&str>) {
        match alias.filter(|a| !a.is_empty()) {
            None => self.aliases.store(Arc::new(HashMap::new())),
            Some(alias) => {
                let key = alias.to_lowercase();
                self.aliases.rcu(|current| {
                    let mut next = HashMap::clone(current);
                    next.remove(&key);
                    next
                });
            }
        }
    }

    /// Looks up a database by exact name (ignoring case), then through the alias map.
    pub fn lookup_database(&self, name: &str) -> Option<&Arc<Database>> {
        if let Some(db) = self.lookup_database_direct(name) {
            return Some(db);
        }
        let aliases = self.aliases.load();
        let real_name = aliases.get(&name.to_lowercase())?;
        self.lookup_database_direct(real_name)
    }

    fn lookup_database_direct(&self, name: &str) -> Option<&Arc<Database>> {
        let lower = name.to_lowercase();
        self.databases
            .binary_search_by(|d| d.name_lower().cmp(lower.as_str()))
            .ok()
            .map(|pos| &self.databases[pos])
    }

    /// Looks up a table by `table` or `db.table` name.
    ///
    /// Unqualified names use unique-prefix matching across all databases.
    /// Dictionary tables (`db._file`) resolve like any other qualified name.
    pub fn lookup_table(&self, name: &str) -> Option<&Arc<Table>> {
        match name.split_once('.') {
            Some((db, table)) => {
                let table = table.split('.').next().unwrap_or_default();
                self.lookup_table_in(db, table)
            }
            None => lookup_unique_prefix(&self.all_tables, name, |t| t.name_lower()),
        }
    }

    /// Looks up a table within one database (alias-aware) by unique prefix.
    pub fn lookup_table_in(&self, db_name: &str, table_name: &str) -> Option<&Arc<Table>> {
        self.lookup_database(db_name)?.lookup_table(table_name)
    }

    /// Looks up a field of a database-qualified table.
    ///
    /// The field name may be abbreviated; uniqueness is not checked.
    pub fn lookup_field(&self, db_name: &str, table_name: &str, field_name: &str) -> Option<&Field> {
        self.lookup_table_in(db_name, table_name)?
            .lookup_field(field_name)
    }

    /// Finds the first table, in table-name order, that has a field matching `name`.
    pub fn lookup_unqualified_field(&self, name: &str) -> Option<(&Arc<Table>, &Field)> {
        self.all_tables
            .iter()
            .find_map(|table| table.lookup_field(name).map(|field| (table, field)))
    }
}
