//! Scope-chain symbol resolution for one compilation unit.

pub mod class_finder;
pub mod resolver;
pub mod root;
pub mod scope;
pub mod type_info;

#[cfg(test)]
mod tests;

pub use class_finder::{dequote, ClassFinder};
pub use resolver::{ContextId, SchemaPriority, ScopeId, SymbolResolver, PROC_TEXT_BUFFER};
pub use root::{CallableKind, RootScope};
pub use scope::{SymbolScope, TableRef, TableType};
pub use type_info::{any_in_type_chain, ClassInfo, TypeInfo, TypeInfoCache, TypeInfoProvider};
