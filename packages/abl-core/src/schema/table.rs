//! Table definitions.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::field::Field;
use super::index::Index;
use super::prefix::lookup_prefix;

/// Storage class of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreType {
    /// Persistent database table
    DbTable,
    /// TEMP-TABLE defined by a compilation unit
    TempTable,
    /// WORK-TABLE defined by a compilation unit
    WorkTable,
}

impl StoreType {
    /// Attribute value stored on record nodes.
    pub fn code(self) -> i32 {
        match self {
            StoreType::DbTable => 1102,
            StoreType::TempTable => 1103,
            StoreType::WorkTable => 1104,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1102 => Some(StoreType::DbTable),
            1103 => Some(StoreType::TempTable),
            1104 => Some(StoreType::WorkTable),
            _ => None,
        }
    }
}

/// Table definition with its fields and indexes.
///
/// Fields are kept both in declaration order and in case-insensitive name
/// order. Equality and hashing ignore case and consider the name only.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    name_lower: String,
    database: String,
    store_type: StoreType,
    fields: Vec<Field>,
    /// Indexes into `fields`, sorted by lowercase name
    name_order: Vec<usize>,
    indexes: Vec<Index>,
}

impl Table {
    /// Creates an empty database table.
    ///
    /// # Arguments
    /// * `name` - Table name
    /// * `database` - Logical name of the owning database
    pub fn new(name: impl Into<String>, database: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name_lower: name.to_lowercase(),
            name,
            database: database.into(),
            store_type: StoreType::DbTable,
            fields: Vec::new(),
            name_order: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Creates an empty temp-table or work-table outside any database.
    pub fn with_store_type(name: impl Into<String>, store_type: StoreType) -> Self {
        let mut table = Self::new(name, "");
        table.store_type = store_type;
        table
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_lower(&self) -> &str {
        &self.name_lower
    }

    /// Owning database name, empty for temp-tables and work-tables.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    /// Adds a field. A field with the same name (ignoring case) is not added twice.
    ///
    /// # Returns
    /// `true` if the field was added.
    pub fn add_field(&mut self, field: Field) -> bool {
        let slot = self
            .name_order
            .binary_search_by(|&i| self.fields[i].name_lower().cmp(field.name_lower()));
        match slot {
            Ok(_) => false,
            Err(pos) => {
                self.name_order.insert(pos, self.fields.len());
                self.fields.push(field);
                true
            }
        }
    }

    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    /// Looks up a field by full name or abbreviation.
    ///
    /// Abbreviations are not checked for uniqueness; the first field in name
    /// order that starts with `name` is returned.
    pub fn lookup_field(&self, name: &str) -> Option<&Field> {
        lookup_prefix(&self.name_order, name, move |&i| self.fields[i].name_lower())
            .map(|&i| &self.fields[i])
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields in case-insensitive name order.
    pub fn fields_by_name(&self) -> impl Iterator<Item = &Field> + '_ {
        self.name_order.iter().map(move |&i| &self.fields[i])
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Copies the table's name, storage class, and field definitions into a
    /// new table that belongs to no database.
    pub fn copy_bare(&self) -> Table {
        let mut copy = Table::with_store_type(self.name.clone(), self.store_type);
        for field in &self.fields {
            copy.add_field(field.copy_bare());
        }
        copy
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name_lower == other.name_lower
    }
}

impl Eq for Table {}

impl Hash for Table {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name_lower.hash(state);
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.store_type {
            StoreType::DbTable => "DB Table",
            StoreType::TempTable => "Temp-table",
            StoreType::WorkTable => "Work-table",
        };
        write!(f, "{} {}", kind, self.name)
    }
}

/// Table reference split into its optional database qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub db: Option<String>,
    pub table: String,
}

impl TableName {
    /// Splits `table` or `db.table`.
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((db, table)) => Self {
                db: Some(db.to_string()),
                table: table.split('.').next().unwrap_or_default().to_string(),
            },
            None => Self {
                db: None,
                table: name.to_string(),
            },
        }
    }

    /// Regenerates the qualified text, omitting an empty database qualifier.
    pub fn generate_name(&self) -> String {
        match self.db.as_deref().filter(|d| !d.is_empty()) {
            Some(db) => format!("{}.{}", db, self.table),
            None => self.table.clone(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate_name())
    }
}
