//! Schema registry loaded from description files on disk.

use ntest::timeout;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

use abl_core::schema::{Schema, StoreType};
use abl_core::types::DataType;
use abl_core::ProparseError;

use super::helpers::{Project, SPORTS_DF};

#[timeout(2000)]
#[test]
fn test_session_schema_from_project_config() {
    let project = Project::new();
    let schema = project.session.schema();

    assert_eq!(schema.databases().len(), 1);
    assert_eq!(schema.databases()[0].name(), "sports");
    assert_eq!(schema.databases()[0].sequences(), ["NextCustNum".to_string()]);

    let order = schema.lookup_table("order").unwrap();
    assert_eq!(order.name(), "Order");
    assert_eq!(order.store_type(), StoreType::DbTable);
    assert_eq!(schema.lookup_table("orderl").map(|t| t.name()), Some("OrderLine"));
    assert!(schema.lookup_table("cust").is_none());

    let balance = schema.lookup_field("SPORTS", "customer", "bal").unwrap();
    assert_eq!(balance.name(), "Balance");
    assert_eq!(balance.data_type(), Some(DataType::Decimal));

    // Meta tables are injected by the session
    assert!(schema.lookup_table("sports._file").is_some());
    assert!(schema.lookup_table("sports._index-field").is_some());
}

#[timeout(2000)]
#[test]
fn test_two_databases() {
    let dir = tempdir().unwrap();
    let sports = dir.path().join("sports.df");
    let hr = dir.path().join("hr.df");
    fs::write(&sports, SPORTS_DF).unwrap();
    fs::write(&hr, "TEmployee\nFEmpNum:integer:0\nFName:character:0\nTDepartment\nFDeptCode:character:0\n")
        .unwrap();

    let schema = Schema::load_files(&[&sports, &hr], false).unwrap();
    let names: Vec<_> = schema.databases().iter().map(|d| d.name().to_string()).collect();
    assert_eq!(names, vec!["hr", "sports"]);

    // Unqualified prefixes are unique across databases
    assert_eq!(schema.lookup_table("emp").map(|t| t.database()), Some("hr"));
    assert!(schema.lookup_table("hr.customer").is_none());
    assert_eq!(
        schema.lookup_table("sports.customer").map(|t| t.database()),
        Some("sports")
    );

    // First table in name order with the field wins
    let (table, field) = schema.lookup_unqualified_field("Name").unwrap();
    assert_eq!(table.name(), "Customer");
    assert_eq!(field.name(), "Name");
    let (table, _) = schema.lookup_unqualified_field("deptcode").unwrap();
    assert_eq!(table.name(), "Department");

    let all: Vec<_> = schema.all_tables().iter().map(|t| t.name().to_string()).collect();
    assert_eq!(
        all,
        vec!["Customer", "CustomerGroup", "Department", "Employee", "Order", "OrderLine"]
    );
}

#[timeout(2000)]
#[test]
fn test_malformed_description_is_rejected() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.df");
    fs::write(&broken, "TCustomer\nFCustNum:integer:0\nQoops\n").unwrap();
    match Schema::load_files(&[&broken], true) {
        Err(ProparseError::SchemaFormat { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected a format error, got {:?}", other),
    }

    let missing = dir.path().join("missing.df");
    assert!(Schema::load_files(&[&missing], true).is_err());
}

#[timeout(5000)]
#[test]
fn test_aliases_under_concurrent_lookups() {
    let project = Project::new();
    let schema = Arc::clone(project.session.schema());
    schema.create_alias("dict", "sports");

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                for n in 0..200 {
                    if i == 0 {
                        schema.create_alias(&format!("tmp{}", n), "sports");
                    }
                    assert_eq!(
                        schema.lookup_table("dict.customer").map(|t| t.name()),
                        Some("Customer")
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(schema.lookup_database("tmp199").is_some());
    schema.delete_alias(Some("dict"));
    assert!(schema.lookup_table("dict.customer").is_none());
    assert!(schema.lookup_database("tmp0").is_some());
    schema.delete_alias(None);
    assert!(schema.lookup_database("tmp0").is_none());
    assert!(schema.lookup_database("SPORTS").is_some());
}
