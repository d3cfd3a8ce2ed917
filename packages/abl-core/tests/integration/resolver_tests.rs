//! Symbol resolution against a project session.

use ntest::timeout;
use std::sync::Arc;
use std::thread;

use abl_core::schema::StoreType;
use abl_core::symbols::{
    CallableKind, ClassInfo, ContextId, SchemaPriority, SymbolResolver, TableType,
    TypeInfoProvider,
};
use abl_core::unit::{UnitContext, UnitParser};

use super::helpers::{LineParser, Project};

const CATALOG: &str = r#"[
    {
        "name": "acme.BaseForm",
        "methods": ["Show", "Close"],
        "properties": ["Title"],
        "buffers": ["ttItem"]
    },
    { "name": "acme.OrderForm", "inherits": "acme.BaseForm" },
    { "name": "acme.util.Logger" },
    { "name": "acme.util.Clock", "isInterface": true }
]"#;

#[timeout(2000)]
#[test]
fn test_class_unit_sees_inherited_names() {
    let project = Project::with_catalog(CATALOG);
    let source = project.write_source(
        "acme/OrderForm.cls",
        "USING acme.*.\nCLASS acme.OrderForm INHERITS BaseForm:\nFIND FIRST ttItem.\nFIND FIRST Customer.\n",
    );

    let mut ctx = UnitContext::new(&project.session, &source);
    let unit = LineParser.parse(&mut ctx).unwrap();
    assert_eq!(unit.class_name.as_deref(), Some("acme.OrderForm"));
    assert_eq!(unit.super_class_name.as_deref(), Some("acme.BaseForm"));

    // ttItem comes from the parent class, Customer from the schema
    assert_eq!(unit.root_symbols.len(), 2);
    let tt = unit.root_symbols[0].schema.as_ref().unwrap();
    assert_eq!(tt.table.store_type(), StoreType::TempTable);
    assert!(!unit.root_symbols[0].uses_db_table());
    assert!(unit.root_symbols[1].uses_db_table());

    let resolver = &ctx.resolver;
    assert!(resolver.is_class());
    assert_eq!(resolver.class_name(), "acme.OrderForm");
    assert!(resolver.is_var("title"));
    assert!(!resolver.is_var("caption"));
    assert_eq!(resolver.is_method_or_function("SHOW"), Some(CallableKind::LocalMethod));
    assert_eq!(resolver.is_method_or_function("Print"), None);
    assert_eq!(resolver.lookup_class_name("OrderForm"), "acme.OrderForm");
    // Only the named package is imported
    assert_eq!(resolver.lookup_class_name("Logger"), "");
    assert_eq!(resolver.lookup_class_name("acme.util.Logger"), "acme.util.Logger");

    assert_eq!(
        project.session.find_file_for_class_name("acme.OrderForm"),
        Some(source)
    );
}

#[timeout(2000)]
#[test]
fn test_procedure_scopes_and_buffers() {
    let project = Project::new();
    let mut resolver = SymbolResolver::for_session(&project.session);

    resolver.def_var("iTotal");
    resolver.def_table("Customer", TableType::TempTable);
    assert_eq!(
        resolver.is_table("customer", SchemaPriority::ScopeFirst),
        Some(TableType::TempTable)
    );
    assert_eq!(
        resolver.is_table("customer", SchemaPriority::SchemaFirst),
        Some(TableType::DbTable)
    );

    resolver.func_begin("calcTotal", Some(ContextId(10)));
    resolver.def_var("dRate");
    resolver.def_buffer("bOrder", "order");
    assert_eq!(resolver.depth(), 1);
    assert!(resolver.is_var("iTotal"));
    assert!(resolver.is_var("dRate"));
    assert_eq!(
        resolver.is_table("bOrder", SchemaPriority::ScopeFirst),
        Some(TableType::DbTable)
    );
    assert_eq!(
        resolver.is_table("sports.bOrder", SchemaPriority::ScopeFirst),
        Some(TableType::DbTable)
    );
    resolver.push_record_expression(ContextId(11), "bOrder", SchemaPriority::ScopeFirst);
    resolver.func_end();

    assert_eq!(resolver.depth(), 0);
    assert!(!resolver.is_var("dRate"));
    assert_eq!(resolver.is_table("bOrder", SchemaPriority::ScopeFirst), None);
    assert_eq!(resolver.record_expression(ContextId(11)), Some(TableType::DbTable));

    // The routine scope is reused when the routine is entered again
    resolver.func_begin("CALCTOTAL", None);
    assert!(resolver.is_var("dRate"));
    resolver.func_end();

    assert!(resolver.is_table_name("orderline"));
    assert!(!resolver.is_table_name("iTotal"));
    assert!(!resolver.is_table_name("sports.order.x"));
    assert!(resolver.record_semantic_predicate("sports", Some("Order"), SchemaPriority::SchemaFirst));
}

#[timeout(2000)]
#[test]
fn test_unknown_table_fails_the_parse() {
    let project = Project::new();
    let source = project.write_source("report.p", "FIND FIRST Invoice.\n");
    let mut ctx = UnitContext::new(&project.session, &source);
    let err = LineParser.parse(&mut ctx).unwrap_err();
    assert!(err.to_string().contains("Invoice"));
}

#[timeout(5000)]
#[test]
fn test_concurrent_type_injection() {
    let project = Project::with_catalog(CATALOG);
    let session = Arc::clone(&project.session);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for n in 0..50 {
                    session.inject_type_info(Arc::new(
                        ClassInfo::new(format!("gen{}.Class{}", i, n)).with_parent("acme.BaseForm"),
                    ));
                    assert!(session.type_info("acme.BaseForm").is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(session.types().len(), 4 + 200);
    assert_eq!(session.classes_in_package("gen2").len(), 50);
    assert!(session.type_info_ci("GEN3.CLASS49").is_some());

    // A resolver created now sees the injected classes
    let mut resolver = SymbolResolver::for_session(&session);
    resolver.define_class("gen1.Class7");
    assert!(resolver.is_var("Title"));
    assert_eq!(
        resolver.is_table("ttItem", SchemaPriority::ScopeFirst),
        Some(TableType::TempTable)
    );
}
