//! Field definitions.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::DataType;

/// Field definition.
///
/// A field lives inside exactly one [`Table`](super::Table); equality and
/// hashing ignore case and consider the name only.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    name_lower: String,
    data_type: Option<DataType>,
    extent: u32,
    class_name: Option<String>,
}

impl Field {
    /// Creates a new field definition.
    ///
    /// # Arguments
    /// * `name` - Field name
    /// * `data_type` - Data type, `None` when not known (ex: defined LIKE an unresolved field)
    /// * `extent` - Array extent, 0 for scalars
    pub fn new(name: impl Into<String>, data_type: Option<DataType>, extent: u32) -> Self {
        let name = name.into();
        Self {
            name_lower: name.to_lowercase(),
            name,
            data_type,
            extent,
            class_name: None,
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_lower(&self) -> &str {
        &self.name_lower
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Copies the attributes a temp-table definition needs from this field.
    pub fn copy_bare(&self) -> Field {
        self.clone()
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name_lower == other.name_lower
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name_lower.hash(state);
    }
}

/// Field reference split into its optional database and table qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName {
    pub db: Option<String>,
    pub table: Option<String>,
    pub field: String,
}

impl FieldName {
    /// Splits `field`, `table.field` or `db.table.field`.
    pub fn parse(name: &str) -> Self {
        let parts: Vec<&str> = name.split('.').collect();
        match parts.as_slice() {
            [field] => Self {
                db: None,
                table: None,
                field: field.to_string(),
            },
            [table, field] => Self {
                db: None,
                table: Some(table.to_string()),
                field: field.to_string(),
            },
            [db, table, field, ..] => Self {
                db: Some(db.to_string()),
                table: Some(table.to_string()),
                field: field.to_string(),
            },
            [] => Self {
                db: None,
                table: None,
                field: String::new(),
            },
        }
    }

    /// Regenerates the qualified text, omitting empty qualifiers.
    pub fn generate_name(&self) -> String {
        let mut buff = String::new();
        if let Some(table) = self.table.as_deref().filter(|t| !t.is_empty()) {
            if let Some(db) = self.db.as_deref().filter(|d| !d.is_empty()) {
                buff.push_str(db);
                buff.push('.');
            }
            buff.push_str(table);
            buff.push('.');
        }
        buff.push_str(&self.field);
        buff
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.generate_name())
    }
}
