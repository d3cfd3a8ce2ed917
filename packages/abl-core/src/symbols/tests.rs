use std::sync::Arc;

use super::*;
use crate::schema::{loader, Database, Schema, StoreType};

const SPORTS: &str = "\
TCustomer
FCustNum:integer:0
FName:character:0
FAddress:character:0
FCity:character:0
FBalance:decimal:0
TCustomerGroup
FGroupId:integer:0
TInvoice
FInvoiceNum:integer:0
";

fn schema() -> Arc<Schema> {
    let mut db = Database::new("sports2000");
    loader::parse_description(&mut db, SPORTS).unwrap();
    let mut schema = Schema::new();
    schema.add_database(db);
    Arc::new(schema)
}

fn types() -> Arc<TypeInfoCache> {
    let cache = TypeInfoCache::new();
    cache.inject(Arc::new(
        ClassInfo::new("acme.Base")
            .with_method("Save")
            .with_property("Count")
            .with_buffer("ttBase"),
    ));
    cache.inject(Arc::new(ClassInfo::new("acme.Child").with_parent("acme.Base")));
    cache.inject(Arc::new(ClassInfo::new("acme.util.Logger")));
    Arc::new(cache)
}

fn resolver() -> SymbolResolver {
    SymbolResolver::new(schema(), types())
}

#[test]
fn test_scope_nesting_discipline() {
    let mut r = resolver();
    r.def_var("outer");
    for depth in 1..=3 {
        r.add_inner_scope(None);
        r.def_var(&format!("v{}", depth));
        assert_eq!(r.depth(), depth);
    }
    assert!(r.is_var("outer"));
    assert!(r.is_var("V1") && r.is_var("v2") && r.is_var("v3"));

    r.drop_inner_scope();
    assert_eq!(r.depth(), 2);
    assert!(!r.is_var("v3"));
    assert!(r.is_var("v2"));

    r.drop_inner_scope();
    r.drop_inner_scope();
    assert_eq!(r.current_scope(), ScopeId::Root);
    assert!(!r.is_var("v1"));
    assert!(r.is_var("outer"));

    // The root stays
    r.drop_inner_scope();
    assert_eq!(r.current_scope(), ScopeId::Root);
}

#[test]
fn test_context_scopes_reentered() {
    let mut r = resolver();
    r.add_inner_scope(Some(ContextId(7)));
    r.def_var("local");
    r.drop_inner_scope();
    assert!(!r.is_var("local"));

    r.enter_scope(ContextId(7));
    assert!(r.is_var("local"));
    r.exit_scope(ContextId(7));
    assert!(!r.is_var("local"));

    // Unknown contexts change nothing
    r.enter_scope(ContextId(8));
    assert_eq!(r.current_scope(), ScopeId::Root);
}

#[test]
fn test_function_scope_reused() {
    let mut r = resolver();
    r.func_begin("Calc", None);
    r.def_var("x");
    r.func_end();
    assert!(!r.is_var("x"));

    r.func_begin("CALC", None);
    assert_eq!(r.depth(), 1);
    assert!(r.is_var("x"));
    r.func_end();

    assert_eq!(r.is_method_or_function("calc"), Some(CallableKind::UserFunction));
    assert_eq!(r.is_method_or_function("other"), None);
}

#[test]
fn test_tables_scope_first_and_schema_first() {
    let mut r = resolver();
    assert_eq!(r.is_table("customer", SchemaPriority::ScopeFirst), Some(TableType::DbTable));
    assert_eq!(r.is_table("Invo", SchemaPriority::SchemaFirst), Some(TableType::DbTable));
    assert_eq!(r.is_table("nothing", SchemaPriority::ScopeFirst), None);
    assert_eq!(
        r.is_table("PROC-TEXT-BUFFER", SchemaPriority::ScopeFirst),
        Some(TableType::TempTable)
    );

    r.def_table("Customer", TableType::TempTable);
    r.def_table("invo", TableType::WorkTable);
    assert_eq!(r.is_table("customer", SchemaPriority::ScopeFirst), Some(TableType::TempTable));
    assert_eq!(r.is_table("customer", SchemaPriority::SchemaFirst), Some(TableType::DbTable));
    // An abbreviation does not take schema precedence
    assert_eq!(r.is_table("invo", SchemaPriority::SchemaFirst), Some(TableType::WorkTable));
    assert_eq!(
        r.is_table("sports2000.customer", SchemaPriority::ScopeFirst),
        Some(TableType::DbTable)
    );
}

#[test]
fn test_buffers() {
    let mut r = resolver();
    r.def_buffer("bCust", "Customer");
    assert_eq!(r.is_table("bcust", SchemaPriority::ScopeFirst), Some(TableType::DbTable));
    assert_eq!(
        r.is_table("sports2000.bCust", SchemaPriority::ScopeFirst),
        Some(TableType::DbTable)
    );

    r.def_buffer("other.bGroup", "CustomerGroup");
    assert_eq!(
        r.is_table("other.bgroup", SchemaPriority::ScopeFirst),
        Some(TableType::DbTable)
    );

    r.def_table("ttOrder", TableType::TempTable);
    r.add_inner_scope(None);
    r.def_buffer("bOrder", "ttOrder");
    assert_eq!(r.is_table("bOrder", SchemaPriority::ScopeFirst), Some(TableType::TempTable));
    r.drop_inner_scope();
    assert_eq!(r.is_table("bOrder", SchemaPriority::ScopeFirst), None);

    // A buffer over an unknown table resolves to nothing
    r.def_buffer("bMissing", "nothing");
    assert_eq!(r.is_table("bmissing", SchemaPriority::ScopeFirst), None);
    assert!(!r.is_table_name("bmissing"));
}

#[test]
fn test_unresolved_buffer_falls_back_to_schema() {
    let mut r = resolver();
    r.def_buffer("Invoice", "ttNowhere");
    assert_eq!(r.is_table("invoice", SchemaPriority::ScopeFirst), Some(TableType::DbTable));
    assert!(r.is_table_name("Invoice"));

    // It still hides a declaration of the same name further out
    r.def_table("ttShadow", TableType::TempTable);
    r.add_inner_scope(None);
    r.def_buffer("ttShadow", "ttNowhere");
    assert_eq!(r.is_table("ttshadow", SchemaPriority::ScopeFirst), None);
    r.drop_inner_scope();
    assert_eq!(
        r.is_table("ttshadow", SchemaPriority::ScopeFirst),
        Some(TableType::TempTable)
    );
}

#[test]
fn test_is_table_name() {
    let mut r = resolver();
    assert!(r.is_table_name("Customer"));
    assert!(r.is_table_name("sports2000.Customer"));
    assert!(!r.is_table_name("sports2000.Customer.Name"));
    r.def_var("customer");
    assert!(!r.is_table_name("Customer"));
}

#[test]
fn test_record_expressions() {
    let mut r = resolver();
    r.push_record_expression(ContextId(1), "customer", SchemaPriority::ScopeFirst);
    r.push_record_expression(ContextId(2), "nothing", SchemaPriority::ScopeFirst);
    assert_eq!(r.record_expression(ContextId(1)), Some(TableType::DbTable));
    assert_eq!(r.record_expression(ContextId(2)), None);
    r.clear_record_expressions();
    assert_eq!(r.record_expression(ContextId(1)), None);

    assert!(r.record_semantic_predicate("sports2000", Some("customer"), SchemaPriority::ScopeFirst));
    assert!(!r.record_semantic_predicate("Cust", Some("Name"), SchemaPriority::ScopeFirst));
    assert!(!r.record_semantic_predicate("bogus", None, SchemaPriority::SchemaFirst));
}

#[test]
fn test_inline_variables() {
    let mut r = resolver();
    r.def_var_inline_last_field();
    assert!(!r.is_inline_var("xTmp"));

    r.add_inner_scope(None);
    r.field_reference("xTmp");
    r.def_var_inline_last_field();
    assert!(r.is_inline_var("XTMP"));
    assert!(r.is_var("xtmp"));
    r.drop_inner_scope();
    assert!(!r.is_inline_var("xtmp"));
}

#[test]
fn test_class_inheritance_fallback() {
    let mut r = resolver();
    assert!(!r.is_class());
    r.define_abstract_class("\"acme.Child\"");
    assert!(r.is_class());
    assert!(r.is_abstract_class());
    assert!(!r.is_interface());
    assert_eq!(r.class_name(), "acme.Child");

    assert_eq!(r.is_table("ttbase", SchemaPriority::ScopeFirst), Some(TableType::TempTable));
    assert!(r.is_var("count"));
    assert_eq!(r.is_method_or_function("SAVE"), Some(CallableKind::LocalMethod));

    // Methods shadow functions of the same name
    r.func_begin("save", None);
    r.func_end();
    assert_eq!(r.is_method_or_function("save"), Some(CallableKind::LocalMethod));

    r.def_method("Run");
    assert_eq!(r.is_method_or_function("run"), Some(CallableKind::LocalMethod));
}

#[test]
fn test_class_flags_without_metadata() {
    let mut r = resolver();
    r.define_interface("acme.IThing");
    assert!(r.is_interface());
    assert!(r.root().type_info().is_none());

    let mut r = resolver();
    r.define_enum("acme.Color");
    assert!(r.is_enum());

    assert!(r.unknown_method_calls_allowed());
    r.disallow_unknown_method_calls();
    assert!(!r.unknown_method_calls_allowed());
    r.allow_unknown_method_calls();
    assert!(r.unknown_method_calls_allowed());
}

#[test]
fn test_class_name_lookup() {
    let mut r = resolver();
    assert_eq!(r.lookup_class_name("Logger"), "");
    r.using_state("acme.util.*");
    assert_eq!(r.lookup_class_name("logger"), "acme.util.Logger");
    assert_eq!(r.lookup_class_name("\"x.y.Z\""), "x.y.Z");
    assert_eq!(r.lookup_class_name("Nope"), "");
}

#[test]
fn test_copy_schema_table() {
    let mut r = resolver();
    let copy = r.copy_schema_table("Customer").unwrap();
    assert_eq!(copy.fields().len(), 5);
    assert_eq!(copy.database(), "");
    assert_eq!(copy.store_type(), StoreType::DbTable);
    assert!(copy.indexes().is_empty());
    assert!(r.root().table_definition("CUSTOMER").is_some());
    assert!(r.copy_schema_table("nothing").is_none());
}
