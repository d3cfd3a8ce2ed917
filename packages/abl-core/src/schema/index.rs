//! Index definitions.

/// One component of an index key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    /// Name of the indexed field, as declared on the table
    pub field: String,
    pub ascending: bool,
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    name: String,
    unique: bool,
    primary: bool,
    fields: Vec<IndexField>,
}

impl Index {
    /// Creates a new index with no key components.
    pub fn new(name: impl Into<String>, unique: bool, primary: bool) -> Self {
        Self {
            name: name.into(),
            unique,
            primary,
            fields: Vec::new(),
        }
    }

    /// Appends a key component.
    pub fn add_field(&mut self, field: impl Into<String>, ascending: bool) {
        self.fields.push(IndexField {
            field: field.into(),
            ascending,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Key components in declaration order.
    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }
}
