//! The outermost scope of a compilation unit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::scope::{SymbolScope, TableType};
use super::type_info::{any_in_type_chain, TypeInfo, TypeInfoProvider};
use crate::schema::Table;

/// Kind of callable a name resolves to at unit level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    /// Method of the unit's class or one of its ancestors
    LocalMethod,
    UserFunction,
}

/// Unit-level scope.
///
/// Besides its own declarations it owns the unit's functions, the methods
/// it declares, the temp-tables copied from schema tables, and the type
/// metadata of the class the unit defines. Misses on buffers, properties
/// and methods fall back to the class's parent chain.
#[derive(Debug, Default)]
pub struct RootScope {
    scope: SymbolScope,
    functions: HashSet<String>,
    methods: HashSet<String>,
    type_info: Option<Arc<dyn TypeInfo>>,
    /// Lowercase name -> table definition
    table_definitions: HashMap<String, Table>,
}

impl RootScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> &SymbolScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut SymbolScope {
        &mut self.scope
    }

    pub fn type_info(&self) -> Option<&Arc<dyn TypeInfo>> {
        self.type_info.as_ref()
    }

    pub fn attach_type_info(&mut self, info: Option<Arc<dyn TypeInfo>>) {
        self.type_info = info;
    }

    pub fn define_function(&mut self, name: &str) {
        self.functions.insert(name.to_lowercase());
    }

    pub fn define_method(&mut self, name: &str) {
        self.methods.insert(name.to_lowercase());
    }

    /// Copies a table's field definitions under the table's own name.
    ///
    /// An existing definition of the same name is kept.
    pub fn copy_table_bare(&mut self, table: &Table) -> &Table {
        self.table_definitions
            .entry(table.name().to_lowercase())
            .or_insert_with(|| table.copy_bare())
    }

    pub fn table_definition(&self, name: &str) -> Option<&Table> {
        self.table_definitions.get(&name.to_lowercase())
    }

    /// Buffers inherited from the class hierarchy resolve as temp-tables.
    pub fn inherited_table(&self, provider: &dyn TypeInfoProvider, name: &str) -> Option<TableType> {
        any_in_type_chain(provider, self.type_info.clone(), |t| t.has_buffer(name))
            .then_some(TableType::TempTable)
    }

    pub fn has_inherited_property(&self, provider: &dyn TypeInfoProvider, name: &str) -> bool {
        any_in_type_chain(provider, self.type_info.clone(), |t| t.has_property(name))
    }

    /// Methods win over user functions of the same name.
    pub fn method_or_function(
        &self,
        provider: &dyn TypeInfoProvider,
        name: &str,
    ) -> Option<CallableKind> {
        let lower = name.to_lowercase();
        if self.methods.contains(&lower)
            || any_in_type_chain(provider, self.type_info.clone(), |t| t.has_method(name))
        {
            return Some(CallableKind::LocalMethod);
        }
        self.functions
            .contains(&lower)
            .then_some(CallableKind::UserFunction)
    }
}
