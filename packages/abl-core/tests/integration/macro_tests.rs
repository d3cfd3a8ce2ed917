//! Macro event tree built from listing files and from a unit parse.

use ntest::timeout;
use std::fs;
use tempfile::tempdir;

use abl_core::macros::{replay_listing_file, MacroDefKind, MacroTracker};
use abl_core::unit::{UnitContext, UnitParser};

use super::helpers::{LineParser, Project};

const ORDERS_LISTING: &str = "\
0 1 1 fileindex 0 orders.p
0 1 1 fileindex 1 inc/header.i
0 1 1 fileindex 2 inc/fields.i
0 1 1 globdef table-name Order
0 2 1 include 1 inc/header.i
0 2 1 incarg 1 Customer
1 1 1 scopdef prefix cust
1 2 1 include 2 inc/fields.i
1 2 1 incarg 1 Name
2 1 1 macroref prefix
2 1 10 macrorefend
2 2 1 macroref table-name
2 2 14 macrorefend
1 2 15 incend
1 3 1 undef prefix
0 2 30 incend
0 3 1 macroref prefix
0 3 10 macrorefend
";

#[timeout(2000)]
#[test]
fn test_replay_listing_file() {
    let dir = tempdir().unwrap();
    let listing = dir.path().join("orders.lst");
    fs::write(&listing, ORDERS_LISTING).unwrap();

    let mut tracker = MacroTracker::new();
    let files = replay_listing_file(&listing, &mut tracker).unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files.get(&2).map(String::as_str), Some("inc/fields.i"));

    let g = tracker.graph();
    let root = g.root();
    let root_events = g.children(root).to_vec();
    assert_eq!(root_events.len(), 3);
    let global = root_events[0];
    let header = root_events[1];
    assert_eq!(g.as_include(header).unwrap().file_index, 1);
    assert_eq!(g.as_include(header).unwrap().num_args(), 1);

    let header_events = g.children(header).to_vec();
    let prefix_def = header_events[0];
    let fields = header_events[1];
    let undef = header_events[2];
    assert_eq!(g.as_def(prefix_def).unwrap().kind, MacroDefKind::Scoped);
    assert_eq!(g.as_def(undef).unwrap().undefines, Some(prefix_def));

    let fields_events = g.children(fields).to_vec();
    assert_eq!(
        g.as_named_ref(fields_events[0]).unwrap().definition,
        Some(prefix_def)
    );
    assert_eq!(g.as_named_ref(fields_events[1]).unwrap().definition, Some(global));
    assert_eq!(g.file_index_of(fields_events[1]), 2);

    // Undefined by the time the main file references it
    assert!(g.as_named_ref(root_events[2]).unwrap().definition.is_none());

    assert_eq!(g.find_include_references(root, 2), vec![fields]);
    assert_eq!(g.find_include_references(header, 1), vec![header]);
    assert!(g.find_include_references(fields, 1).is_empty());
    assert_eq!(
        g.source_array(),
        vec![root, header, fields, fields_events[0], fields_events[1], root_events[2]]
    );

    // The global definition lies outside the include; the scoped one inside
    let external = g.find_external_macro_references(fields, None, None);
    assert_eq!(external, vec![fields_events[0], fields_events[1]]);
    let external = g.find_external_macro_references(header, None, None);
    assert_eq!(external, vec![fields]);
}

#[timeout(2000)]
#[test]
fn test_missing_listing_file() {
    let dir = tempdir().unwrap();
    let mut tracker = MacroTracker::new();
    assert!(replay_listing_file(&dir.path().join("none.lst"), &mut tracker).is_err());
}

#[timeout(2000)]
#[test]
fn test_tracking_during_parse() {
    let project = Project::new();
    let main = project.write_source(
        "main.p",
        "&GLOBAL-DEFINE appname Orders\n{common.i}\nDISPLAY {&appname} {&localvar}.\n",
    );
    project.write_source("common.i", "&SCOPED-DEFINE localvar cName\n{nested.i}\n");
    project.write_source("nested.i", "MESSAGE {&localvar} {&appname}.\n");

    let mut ctx = UnitContext::new(&project.session, &main);
    let unit = LineParser.parse(&mut ctx).unwrap();
    assert_eq!(unit.ast.file_names().len(), 3);
    assert!(unit.ast.file_names()[2].ends_with("nested.i"));

    let g = ctx.tracker.graph();
    let root = g.root();
    let root_events = g.children(root).to_vec();
    assert_eq!(root_events.len(), 4);
    let appname = root_events[0];
    let common = root_events[1];
    assert_eq!(g.as_include(common).unwrap().file_ref_name, "common.i");

    let common_events = g.children(common).to_vec();
    let localvar = common_events[0];
    let nested = common_events[1];
    let nested_events = g.children(nested).to_vec();
    assert_eq!(g.as_named_ref(nested_events[0]).unwrap().definition, Some(localvar));
    assert_eq!(g.as_named_ref(nested_events[1]).unwrap().definition, Some(appname));

    // Scoped define is gone once its include ends; the global is not
    assert_eq!(g.as_named_ref(root_events[2]).unwrap().definition, Some(appname));
    assert!(g.as_named_ref(root_events[3]).unwrap().definition.is_none());

    assert_eq!(g.source_array().len(), 7);
    assert_eq!(g.find_include_references(root, 2), vec![nested]);

    let pos = g.definition_position(localvar);
    assert_eq!((pos.file_index, pos.line, pos.column), (1, 1, 1));
    let pos = g.position(nested_events[1]);
    assert_eq!((pos.file_index, pos.line), (2, 1));
}

#[timeout(2000)]
#[test]
fn test_missing_include_fails_the_parse() {
    let project = Project::new();
    let main = project.write_source("main.p", "{absent.i}\n");
    let mut ctx = UnitContext::new(&project.session, &main);
    let err = LineParser.parse(&mut ctx).unwrap_err();
    assert!(err.to_string().contains("absent.i"));
}
