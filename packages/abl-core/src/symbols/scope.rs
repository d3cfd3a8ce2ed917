//! Names declared in one lexical scope.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::schema::StoreType;

/// Kind of record a table name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableType {
    DbTable,
    TempTable,
    WorkTable,
}

impl TableType {
    pub fn store_type(self) -> StoreType {
        match self {
            TableType::DbTable => StoreType::DbTable,
            TableType::TempTable => StoreType::TempTable,
            TableType::WorkTable => StoreType::WorkTable,
        }
    }

    pub fn from_store_type(store_type: StoreType) -> Self {
        match store_type {
            StoreType::DbTable => TableType::DbTable,
            StoreType::TempTable => TableType::TempTable,
            StoreType::WorkTable => TableType::WorkTable,
        }
    }
}

/// A table or buffer name declared in a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    /// `None` when a buffer names a table nothing resolves.
    pub table_type: Option<TableType>,
    /// Lowercase table name a named buffer stands for
    pub buffer_for: Option<String>,
    pub db_name: Option<String>,
    /// Schema spelling of the table a buffer stands for
    pub full_name: Option<String>,
}

impl TableRef {
    pub fn table(table_type: TableType) -> Self {
        Self {
            table_type: Some(table_type),
            ..Default::default()
        }
    }
}

/// Tables, buffers and variables declared directly in one scope.
///
/// Keys are lowercase.
#[derive(Debug, Default, Clone)]
pub struct SymbolScope {
    tables: HashMap<String, TableRef>,
    vars: HashSet<String>,
    inline_vars: HashSet<String>,
}

impl SymbolScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_var(&mut self, name: &str) {
        self.vars.insert(name.to_lowercase());
    }

    /// Variables declared inline are plain variables too.
    pub fn define_inline_var(&mut self, name: &str) {
        let lower = name.to_lowercase();
        self.vars.insert(lower.clone());
        self.inline_vars.insert(lower);
    }

    pub fn define_table(&mut self, name: &str, table_type: TableType) {
        self.tables
            .insert(name.to_lowercase(), TableRef::table(table_type));
    }

    pub fn define_table_ref(&mut self, name: &str, table_ref: TableRef) {
        self.tables.insert(name.to_lowercase(), table_ref);
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains(&name.to_lowercase())
    }

    pub fn has_inline_var(&self, name: &str) -> bool {
        self.inline_vars.contains(&name.to_lowercase())
    }

    pub fn table_ref(&self, name: &str) -> Option<&TableRef> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
