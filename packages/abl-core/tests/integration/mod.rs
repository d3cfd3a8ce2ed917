//! Integration test suite for the front-end core.
//!
//! Tests are organized by component:
//! - Schema registry loading and lookups
//! - Macro event tree built from listings and live callbacks
//! - Symbol resolution against a project session
//! - Parse-unit binary cache round trips and invalidation

pub mod helpers;
pub mod macro_tests;
pub mod pub_cache_tests;
pub mod resolver_tests;
pub mod schema_tests;
