//! Scope-chain name resolution used while parsing one compilation unit.

use std::collections::HashMap;
use std::sync::Arc;

use super::class_finder::{dequote, ClassFinder};
use super::root::{CallableKind, RootScope};
use super::scope::{SymbolScope, TableRef, TableType};
use super::type_info::TypeInfoProvider;
use crate::schema::{Schema, Table, TableName};
use crate::session::Session;

/// Built-in buffer available in every unit.
pub const PROC_TEXT_BUFFER: &str = "proc-text-buffer";

/// Identity of a grammar rule context, supplied by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

/// Whether a table name is first matched against the schema or against
/// the names declared in the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPriority {
    SchemaFirst,
    #[default]
    ScopeFirst,
}

/// Position in the scope chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeId {
    Root,
    Inner(usize),
}

#[derive(Debug)]
struct InnerScope {
    scope: SymbolScope,
    parent: ScopeId,
}

/// Resolver for one compilation unit.
///
/// Inner scopes live in a vector and point at their enclosing scope, so a
/// routine scope can be re-entered later while the chain stays intact.
/// Every query answers "not found" rather than failing.
pub struct SymbolResolver {
    schema: Arc<Schema>,
    types: Arc<dyn TypeInfoProvider>,
    root: RootScope,
    inner: Vec<InnerScope>,
    current: ScopeId,
    /// Lowercase routine name -> its scope
    func_scopes: HashMap<String, ScopeId>,
    ctx_scopes: HashMap<ContextId, ScopeId>,
    record_expressions: HashMap<ContextId, Option<TableType>>,
    class_finder: ClassFinder,
    class_name: String,
    unit_is_abstract: bool,
    unit_is_interface: bool,
    unit_is_enum: bool,
    allow_unknown_method_calls: bool,
    last_field_id: Option<String>,
}

impl std::fmt::Debug for SymbolResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolResolver")
            .field("current", &self.current)
            .field("inner_scopes", &self.inner.len())
            .field("class_name", &self.class_name)
            .finish()
    }
}

impl SymbolResolver {
    /// Creates a resolver over a schema and a type-metadata provider.
    ///
    /// # Arguments
    /// * `schema` - Registry consulted for database tables
    /// * `types` - Class metadata used for inherited names and `USING`
    pub fn new(schema: Arc<Schema>, types: Arc<dyn TypeInfoProvider>) -> Self {
        Self {
            schema,
            types,
            root: RootScope::new(),
            inner: Vec::new(),
            current: ScopeId::Root,
            func_scopes: HashMap::new(),
            ctx_scopes: HashMap::new(),
            record_expressions: HashMap::new(),
            class_finder: ClassFinder::new(),
            class_name: String::new(),
            unit_is_abstract: false,
            unit_is_interface: false,
            unit_is_enum: false,
            allow_unknown_method_calls: true,
            last_field_id: None,
        }
    }

    /// Resolver sharing the schema and type cache of a session.
    pub fn for_session(session: &Arc<Session>) -> Self {
        Self::new(session.schema().clone(), session.clone())
    }

    pub fn root(&self) -> &RootScope {
        &self.root
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Depth of the current scope, 0 for the root.
    pub fn depth(&self) -> usize {
        self.chain().count() - 1
    }

    fn scope(&self, id: ScopeId) -> &SymbolScope {
        match id {
            ScopeId::Root => self.root.scope(),
            ScopeId::Inner(i) => &self.inner[i].scope,
        }
    }

    fn current_mut(&mut self) -> &mut SymbolScope {
        match self.current {
            ScopeId::Root => self.root.scope_mut(),
            ScopeId::Inner(i) => &mut self.inner[i].scope,
        }
    }

    fn parent_of(&self, id: ScopeId) -> Option<ScopeId> {
        match id {
            ScopeId::Root => None,
            ScopeId::Inner(i) => Some(self.inner[i].parent),
        }
    }

    /// Scopes from the current one out to the root.
    fn chain(&self) -> impl Iterator<Item = &SymbolScope> + '_ {
        std::iter::successors(Some(self.current), move |&id| self.parent_of(id))
            .map(move |id| self.scope(id))
    }

    fn push_scope(&mut self) -> ScopeId {
        self.inner.push(InnerScope {
            scope: SymbolScope::new(),
            parent: self.current,
        });
        let id = ScopeId::Inner(self.inner.len() - 1);
        self.current = id;
        id
    }

    /// Opens a scope nested in the current one.
    ///
    /// The scope is remembered under `ctx` so a later tree walk can enter
    /// it again with [`enter_scope`](Self::enter_scope).
    pub fn add_inner_scope(&mut self, ctx: Option<ContextId>) {
        let id = self.push_scope();
        if let Some(ctx) = ctx {
            self.ctx_scopes.insert(ctx, id);
        }
    }

    /// Returns to the enclosing scope. The root is never dropped.
    pub fn drop_inner_scope(&mut self) {
        match self.parent_of(self.current) {
            Some(parent) => self.current = parent,
            None => tracing::debug!("Ignoring scope drop at unit level"),
        }
    }

    /// Makes the scope registered for `ctx` current, if there is one.
    pub fn enter_scope(&mut self, ctx: ContextId) {
        if let Some(&id) = self.ctx_scopes.get(&ctx) {
            self.current = id;
        }
    }

    /// Leaves the scope registered for `ctx`, if there is one.
    pub fn exit_scope(&mut self, ctx: ContextId) {
        if self.ctx_scopes.contains_key(&ctx) {
            self.drop_inner_scope();
        }
    }

    /// Starts a function or procedure body.
    ///
    /// A routine seen before (a forward declaration, say) gets its old
    /// scope back; otherwise a new scope is opened and the name is declared
    /// as a unit function.
    pub fn func_begin(&mut self, name: &str, ctx: Option<ContextId>) {
        let lower = name.to_lowercase();
        if let Some(&id) = self.func_scopes.get(&lower) {
            self.current = id;
            if let Some(ctx) = ctx {
                self.ctx_scopes.insert(ctx, id);
            }
            return;
        }
        self.add_inner_scope(ctx);
        self.func_scopes.insert(lower, self.current);
        self.root.define_function(name);
        tracing::trace!("Function {} declared", name);
    }

    pub fn func_end(&mut self) {
        self.drop_inner_scope();
    }

    pub fn def_var(&mut self, name: &str) {
        tracing::trace!("Variable {} declared", name);
        self.current_mut().define_var(name);
    }

    pub fn def_var_inline(&mut self, name: &str) {
        self.current_mut().define_inline_var(name);
    }

    /// Remembers the identifier of the field reference parsed last.
    pub fn field_reference(&mut self, id: &str) {
        self.last_field_id = Some(id.to_string());
    }

    /// Declares the last referenced field as an inline variable.
    pub fn def_var_inline_last_field(&mut self) {
        match self.last_field_id.clone() {
            Some(id) => self.def_var_inline(&id),
            None => tracing::warn!("Inline variable definition without a field reference"),
        }
    }

    pub fn def_table(&mut self, name: &str, table_type: TableType) {
        tracing::trace!("Table {} declared as {:?}", name, table_type);
        self.current_mut().define_table(name, table_type);
    }

    /// Method declared by the unit's own class.
    pub fn def_method(&mut self, name: &str) {
        self.root.define_method(name);
    }

    /// Declares a named buffer for `table`.
    ///
    /// A buffer for a database table is also declared as `db.buffer`, where
    /// `db` is the qualifier written in `buffer` or else the table's
    /// database.
    pub fn def_buffer(&mut self, buffer: &str, table: &str) {
        let buffer_lower = buffer.to_lowercase();
        let table_lower = table.to_lowercase();
        let table_type = self.is_table(&table_lower, SchemaPriority::SchemaFirst);
        let mut table_ref = TableRef {
            table_type,
            buffer_for: Some(table_lower.clone()),
            db_name: None,
            full_name: None,
        };
        let mut qualified = None;
        if table_type == Some(TableType::DbTable) {
            if let Some(schema_table) = self.schema.lookup_table(&table_lower) {
                table_ref.db_name = Some(schema_table.database().to_string());
                table_ref.full_name = Some(schema_table.name().to_string());
            }
            let name = TableName::parse(&buffer_lower);
            let db = name.db.or_else(|| table_ref.db_name.clone());
            if let Some(db) = db {
                qualified = Some(format!("{}.{}", db.to_lowercase(), name.table));
            }
        }
        let scope = self.current_mut();
        if let Some(qualified) = qualified {
            scope.define_table_ref(&qualified, table_ref.clone());
        }
        scope.define_table_ref(&buffer_lower, table_ref);
    }

    /// Copies a schema table's fields into the unit as a table definition.
    pub fn copy_schema_table(&mut self, name: &str) -> Option<&Table> {
        let table = self.schema.lookup_table(name)?.clone();
        Some(self.root.copy_table_bare(&table))
    }

    /// Resolves a table or buffer name.
    ///
    /// With [`SchemaPriority::SchemaFirst`] a schema table whose full name
    /// matches wins; otherwise declarations visible from the current scope
    /// come before abbreviated schema names.
    pub fn is_table(&self, name: &str, priority: SchemaPriority) -> Option<TableType> {
        let lower = name.to_lowercase();
        if priority == SchemaPriority::SchemaFirst {
            let table_part = lower.rsplit('.').next().unwrap_or(&lower);
            if let Some(table) = self.schema.lookup_table(&lower) {
                if table.name().len() == table_part.len() {
                    return Some(TableType::DbTable);
                }
            }
        }
        if lower.contains('.') && self.schema.lookup_table(&lower).is_some() {
            return Some(TableType::DbTable);
        }
        // An unresolved buffer hides outer declarations but not the schema
        if let Some(Some(found)) = self.lookup_table_definition(&lower) {
            return Some(found);
        }
        if self.schema.lookup_table(&lower).is_some() {
            return Some(TableType::DbTable);
        }
        (lower == PROC_TEXT_BUFFER).then_some(TableType::TempTable)
    }

    /// Walks the declared tables outward.
    ///
    /// The outer `Option` is whether a declaration was found at all; a
    /// buffer over an unresolved table shadows outer declarations with
    /// `None`.
    fn lookup_table_definition(&self, lower: &str) -> Option<Option<TableType>> {
        if let Some(found) = self.chain().find_map(|scope| scope.table_ref(lower)) {
            return Some(found.table_type);
        }
        self.root
            .inherited_table(self.types.as_ref(), lower)
            .map(Some)
    }

    /// Names with two or more dots and names of variables are never tables.
    pub fn is_table_name(&self, text: &str) -> bool {
        if text.matches('.').count() >= 2 || self.is_var(text) {
            return false;
        }
        self.is_table(text, SchemaPriority::ScopeFirst).is_some()
    }

    pub fn is_var(&self, name: &str) -> bool {
        self.chain().any(|scope| scope.has_var(name))
            || self.root.has_inherited_property(self.types.as_ref(), name)
    }

    pub fn is_inline_var(&self, name: &str) -> bool {
        self.chain().any(|scope| scope.has_inline_var(name))
    }

    /// Resolved at unit level only.
    pub fn is_method_or_function(&self, name: &str) -> Option<CallableKind> {
        self.root.method_or_function(self.types.as_ref(), name)
    }

    /// Decides whether the upcoming tokens name a record.
    ///
    /// # Arguments
    /// * `first` - Text of the first token
    /// * `named_suffix` - Text after a `NAMEDOT` token, when the second
    ///   token is one
    /// * `priority` - Schema versus scope precedence
    pub fn record_semantic_predicate(
        &self,
        first: &str,
        named_suffix: Option<&str>,
        priority: SchemaPriority,
    ) -> bool {
        let name = match named_suffix {
            Some(suffix) => format!("{}.{}", first, suffix),
            None => first.to_string(),
        };
        self.is_table(&name, priority).is_some()
    }

    /// Records the table type a record expression resolved to.
    pub fn push_record_expression(
        &mut self,
        ctx: ContextId,
        record_name: &str,
        priority: SchemaPriority,
    ) {
        let table_type = self.is_table(record_name, priority);
        self.record_expressions.insert(ctx, table_type);
    }

    pub fn record_expression(&self, ctx: ContextId) -> Option<TableType> {
        self.record_expressions.get(&ctx).copied().flatten()
    }

    pub fn clear_record_expressions(&mut self) {
        self.record_expressions.clear();
    }

    pub fn define_class(&mut self, name: &str) {
        self.class_name = dequote(name);
        let info = self.types.type_info(&self.class_name);
        if info.is_none() {
            tracing::debug!("No type information for class {}", self.class_name);
        }
        self.root.attach_type_info(info);
    }

    pub fn define_abstract_class(&mut self, name: &str) {
        self.define_class(name);
        self.unit_is_abstract = true;
    }

    pub fn define_interface(&mut self, name: &str) {
        self.define_class(name);
        self.unit_is_interface = true;
    }

    pub fn define_enum(&mut self, name: &str) {
        self.define_class(name);
        self.unit_is_enum = true;
    }

    pub fn is_class(&self) -> bool {
        !self.class_name.is_empty()
    }

    pub fn is_abstract_class(&self) -> bool {
        self.unit_is_abstract
    }

    pub fn is_interface(&self) -> bool {
        self.unit_is_interface
    }

    pub fn is_enum(&self) -> bool {
        self.unit_is_enum
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn allow_unknown_method_calls(&mut self) {
        self.allow_unknown_method_calls = true;
    }

    pub fn disallow_unknown_method_calls(&mut self) {
        self.allow_unknown_method_calls = false;
    }

    pub fn unknown_method_calls_allowed(&self) -> bool {
        self.allow_unknown_method_calls
    }

    /// `USING` statement.
    pub fn using_state(&mut self, type_name: &str) {
        self.class_finder.add_path(self.types.as_ref(), type_name);
    }

    /// Qualified name of a class as written in source, or `""`.
    pub fn lookup_class_name(&self, text: &str) -> String {
        self.class_finder.lookup(self.types.as_ref(), text)
    }
}
