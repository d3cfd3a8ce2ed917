//! Parse-unit binaries built by a real parse, reloaded, and invalidated.

use ntest::timeout;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use abl_core::ast::node_type as nt;
use abl_core::persistence::{LoadDepth, LoadFailure, ParseUnitBinary};
use abl_core::types::DataType;

use super::helpers::{LineParser, Project};

const MAIN: &str = "\
{defs.i}
DEFINE NEW SHARED VARIABLE iCount AS INTEGER.
DEFINE SHARED VARIABLE cMode AS CHARACTER.
DEFINE TEMP-TABLE ttLine.
FIND FIRST Customer.
FIND FIRST ttLine.
";

const DEFS: &str = "\
DEFINE VARIABLE dRate AS DECIMAL.
FIND FIRST Order.
";

fn touch_future(path: &Path) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(120))
        .unwrap();
}

#[timeout(5000)]
#[test]
fn test_build_then_load_end_to_end() {
    let project = Project::new();
    let main = project.write_source("main.p", MAIN);
    project.write_source("defs.i", DEFS);

    let mut built = ParseUnitBinary::new(&project.session, &main);
    assert!(built
        .artifact_path()
        .starts_with(project.dir.path().join("pubs")));
    let unit = built.build(&LineParser).unwrap();
    assert!(built.artifact_path().exists());
    assert_eq!(unit.ast.file_names().len(), 2);

    let mut loaded = ParseUnitBinary::new(&project.session, &main);
    loaded.load().unwrap();
    assert!(loaded.is_current());
    assert_eq!(loaded.depth(), LoadDepth::StringsLoaded);
    assert_eq!(loaded.file_names(), unit.ast.file_names());
    assert_eq!(loaded.ast().unwrap().dump(), unit.ast.dump());

    assert_eq!(loaded.exports().len(), 1);
    assert_eq!(loaded.exports()[0].symbol_name, "iCount");
    assert_eq!(loaded.exports()[0].data_type, Some(DataType::Integer));
    assert_eq!(loaded.imports().len(), 1);
    assert_eq!(loaded.imports()[0].symbol_name, "cMode");
    assert_eq!(loaded.imports()[0].progress_type, nt::VARIABLE);

    // Temp-tables are not part of the schema footprint
    let mut tables = BTreeSet::new();
    loaded.copy_schema_table_lowercase_names_into(&mut tables);
    let expected: BTreeSet<String> = ["sports.customer", "sports.order"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(tables, expected);

    let id_texts: Vec<_> = {
        let ast = loaded.ast().unwrap();
        ast.descendants(ast.root())
            .into_iter()
            .map(|id| ast.node(id))
            .filter(|n| n.node_type == nt::ID)
            .map(|n| n.text().to_string())
            .collect()
    };
    assert_eq!(id_texts, vec!["dRate", "iCount", "cMode", "ttLine"]);
}

#[timeout(5000)]
#[test]
fn test_include_change_forces_rebuild() {
    let project = Project::new();
    let main = project.write_source("main.p", MAIN);
    let defs = project.write_source("defs.i", DEFS);

    let mut unit_pub = ParseUnitBinary::new(&project.session, &main);
    unit_pub.build(&LineParser).unwrap();

    let mut check = ParseUnitBinary::new(&project.session, &main);
    assert!(check.load_to(LoadDepth::HeaderLoaded).is_ok());
    assert!(check.ast().is_none());

    fs::write(&defs, "DEFINE VARIABLE dRate AS DECIMAL.\nFIND FIRST OrderLine.\n").unwrap();
    touch_future(&defs);
    match check.load() {
        Err(LoadFailure::FileChanged(name)) => assert!(name.ends_with("defs.i")),
        other => panic!("expected a stale include, got {:?}", other),
    }
    assert!(!check.is_current());

    // Rebuilding picks up the new include contents
    let unit = check.build(&LineParser).unwrap();
    assert!(unit
        .root_symbols
        .iter()
        .any(|s| s.schema.as_ref().is_some_and(|r| r.table.name() == "OrderLine")));
    touch_future(check.artifact_path());

    let mut fresh = ParseUnitBinary::new(&project.session, &main);
    fresh.load().unwrap();
    let mut tables = Vec::new();
    fresh.copy_schema_table_lowercase_names_into(&mut tables);
    assert_eq!(tables, vec!["sports.customer", "sports.orderline"]);
}

#[timeout(5000)]
#[test]
fn test_failed_parse_leaves_no_artifact() {
    let project = Project::new();
    let main = project.write_source("main.p", MAIN);
    project.write_source("defs.i", DEFS);

    let mut unit_pub = ParseUnitBinary::new(&project.session, &main);
    unit_pub.build(&LineParser).unwrap();
    assert!(unit_pub.artifact_path().exists());

    project.write_source("main.p", "FIND FIRST Nowhere.\n");
    assert!(unit_pub.build(&LineParser).is_err());
    assert!(!unit_pub.artifact_path().exists());
    assert_eq!(unit_pub.load(), Err(LoadFailure::Missing));
}

#[timeout(10000)]
#[test]
fn test_parallel_builds_share_a_session() {
    let project = Project::new();
    project.write_source("defs.i", DEFS);
    let sources: Vec<_> = (0..8)
        .map(|i| {
            project.write_source(
                &format!("units/unit{}.p", i),
                &format!("{{defs.i}}\nDEFINE NEW SHARED VARIABLE v{} AS LOGICAL.\n", i),
            )
        })
        .collect();

    let handles: Vec<_> = sources
        .iter()
        .cloned()
        .map(|source| {
            let session = Arc::clone(&project.session);
            thread::spawn(move || {
                let mut unit_pub = ParseUnitBinary::new(&session, &source);
                unit_pub.build(&LineParser).map(|unit| unit.ast.len())
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap().unwrap() > 1);
    }

    for (i, source) in sources.iter().enumerate() {
        let mut unit_pub = ParseUnitBinary::new(&project.session, source);
        unit_pub.load_to(LoadDepth::ExportsLoaded).unwrap();
        assert_eq!(unit_pub.exports()[0].symbol_name, format!("v{}", i));
        assert_eq!(unit_pub.exports()[0].data_type, Some(DataType::Logical));
    }
}
