//! What parsing one compilation unit produces, and the parser seam.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ast::Ast;
use crate::error::Result;
use crate::macros::MacroTracker;
use crate::schema::{StoreType, Table};
use crate::session::Session;
use crate::symbols::SymbolResolver;
use crate::types::DataType;

/// Symbol kind, name and type recorded in the import and export tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRef {
    /// Node type of the defining keyword, e.g. `VARIABLE` or `BUFFER`
    pub progress_type: i32,
    /// Name as defined
    pub symbol_name: String,
    /// `None` for symbols that are not fields or variables
    pub data_type: Option<DataType>,
    /// Set only when `data_type` is [`DataType::Class`]
    pub class_name: Option<String>,
}

impl SymbolRef {
    pub fn new(progress_type: i32, symbol_name: impl Into<String>) -> Self {
        Self {
            progress_type,
            symbol_name: symbol_name.into(),
            data_type: None,
            class_name: None,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.data_type = Some(DataType::Class);
        self.class_name = Some(class_name.into());
        self
    }
}

/// How a unit-level symbol is shared with other units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sharing {
    #[default]
    Local,
    /// `DEFINE SHARED`
    Imported,
    /// `DEFINE NEW [GLOBAL] SHARED`
    Exported,
}

/// Schema table, and optionally one of its fields, that a symbol refers to.
#[derive(Debug, Clone)]
pub struct SchemaRef {
    pub table: Arc<Table>,
    pub field: Option<String>,
}

/// Symbol declared in the unit's root scope.
#[derive(Debug, Clone)]
pub struct RootSymbol {
    pub symbol: SymbolRef,
    pub sharing: Sharing,
    /// Set for record buffers and field buffers
    pub schema: Option<SchemaRef>,
}

impl RootSymbol {
    pub fn local(symbol: SymbolRef) -> Self {
        Self {
            symbol,
            sharing: Sharing::Local,
            schema: None,
        }
    }

    pub fn shared(symbol: SymbolRef, sharing: Sharing) -> Self {
        Self {
            symbol,
            sharing,
            schema: None,
        }
    }

    pub fn with_schema(mut self, table: Arc<Table>, field: Option<String>) -> Self {
        self.schema = Some(SchemaRef { table, field });
        self
    }

    /// Whether the symbol uses a database table rather than a temp or work table.
    pub fn uses_db_table(&self) -> bool {
        self.schema
            .as_ref()
            .is_some_and(|s| s.table.store_type() == StoreType::DbTable)
    }
}

/// Result of parsing one compilation unit.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    /// File names the tree's file indexes refer to are kept on the tree
    pub ast: Ast,
    pub class_name: Option<String>,
    pub super_class_name: Option<String>,
    pub root_symbols: Vec<RootSymbol>,
}

impl ParsedUnit {
    pub fn new(ast: Ast) -> Self {
        Self {
            ast,
            class_name: None,
            super_class_name: None,
            root_symbols: Vec::new(),
        }
    }

    pub fn imports(&self) -> impl Iterator<Item = &SymbolRef> + '_ {
        self.shared_as(Sharing::Imported)
    }

    pub fn exports(&self) -> impl Iterator<Item = &SymbolRef> + '_ {
        self.shared_as(Sharing::Exported)
    }

    fn shared_as(&self, sharing: Sharing) -> impl Iterator<Item = &SymbolRef> + '_ {
        self.root_symbols
            .iter()
            .filter(move |s| s.sharing == sharing)
            .map(|s| &s.symbol)
    }
}

/// Per-unit state handed to a parser.
#[derive(Debug)]
pub struct UnitContext {
    pub session: Arc<Session>,
    pub path: PathBuf,
    pub tracker: MacroTracker,
    pub resolver: SymbolResolver,
}

impl UnitContext {
    pub fn new(session: &Arc<Session>, path: &Path) -> Self {
        Self {
            session: session.clone(),
            path: path.to_path_buf(),
            tracker: MacroTracker::new(),
            resolver: SymbolResolver::for_session(session),
        }
    }
}

/// Preprocesses and parses a compilation unit.
///
/// Implementations feed preprocessor events to `ctx.tracker` and route
/// declarations and lookups through `ctx.resolver`.
pub trait UnitParser: Send + Sync {
    fn parse(&self, ctx: &mut UnitContext) -> Result<ParsedUnit>;
}
