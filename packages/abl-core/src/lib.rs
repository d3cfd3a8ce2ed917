//! Front-end core for ABL source analysis.
//!
//! Provides the schema registry, the macro/include event tree, scope-chain
//! symbol resolution, and the versioned parse-unit binary cache.

pub mod ast;
pub mod config;
pub mod error;
pub mod macros;
pub mod persistence;
pub mod schema;
pub mod session;
pub mod symbols;
pub mod types;
pub mod unit;

pub use error::{ProparseError, Result};
pub use session::Session;
