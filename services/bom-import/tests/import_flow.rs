//! End-to-end import flow against the in-memory ION

use ion_bom_import::{run_import, ImportOptions, InMemoryPartsApi, RemoteError};
use ion_models::FailureKind;
use ion_utils::{BomFormat, BomReader, LevelFormat};

const ASSEMBLY_CSV: &str = "\
Item No.,Part Number,Description,Qty,Rev,VendorNo
1,FRAME-100,Welded frame,1,B,
1.1,BRKT-7,Bracket,4,,MC-9100
1.1.1,SCR-M4,M4 screw,2,1,
1.2,SCR-M4,M4 screw,8,,
2,PANEL-3,Side panel,2,A,
";

fn read(csv: &str) -> Vec<ion_models::BomRow> {
    BomReader::new()
        .with_level_format(LevelFormat::Outline)
        .with_top_level("CART-1")
        .parse_bytes("cart.csv", csv.as_bytes(), Some(BomFormat::Csv))
        .unwrap()
        .rows
}

#[test]
fn test_export_is_mirrored_into_ion() {
    let mut api = InMemoryPartsApi::new();
    let report = run_import(read(ASSEMBLY_CSV), &mut api, ImportOptions::default()).unwrap();

    assert!(!report.has_failures());
    assert_eq!(report.summary().total, 6);
    // SCR-M4 appears twice but is created once
    assert_eq!(report.parts_created, 5);
    assert_eq!(report.links_created, 5);

    assert_eq!(api.link_between("CART-1", "FRAME-100").unwrap().quantity, 1.0);
    assert_eq!(api.link_between("FRAME-100", "BRKT-7").unwrap().quantity, 4.0);
    assert_eq!(api.link_between("BRKT-7", "SCR-M4").unwrap().quantity, 2.0);
    assert_eq!(api.link_between("FRAME-100", "SCR-M4").unwrap().quantity, 8.0);
    assert_eq!(api.link_between("CART-1", "PANEL-3").unwrap().quantity, 2.0);

    let frame = api.created_input("FRAME-100").unwrap();
    assert_eq!(frame.revision.as_deref(), Some("B"));
    let bracket = api.created_input("BRKT-7").unwrap();
    assert_eq!(bracket.supplier_part_number.as_deref(), Some("MC-9100"));
    // Numeric revisions are not sent
    assert_eq!(api.created_input("SCR-M4").unwrap().revision, None);
}

#[test]
fn test_second_run_creates_nothing_new() {
    let mut api = InMemoryPartsApi::new();
    run_import(read(ASSEMBLY_CSV), &mut api, ImportOptions::default()).unwrap();
    let creates_after_first = api.calls().create_part;

    let report = run_import(read(ASSEMBLY_CSV), &mut api, ImportOptions::default()).unwrap();

    assert_eq!(api.calls().create_part, creates_after_first);
    assert_eq!(report.parts_created, 0);
    assert_eq!(api.links().len(), 5);
    // Every link already existed
    assert_eq!(
        report.failures().filter(|o| o.failure == Some(FailureKind::LinkCreation)).count(),
        5
    );
}

#[test]
fn test_existing_parts_are_linked_not_recreated() {
    let mut api = InMemoryPartsApi::new().with_part("SCR-M4").with_part("PANEL-3");
    let report = run_import(read(ASSEMBLY_CSV), &mut api, ImportOptions::default()).unwrap();

    assert!(!report.has_failures());
    assert_eq!(report.parts_created, 3);
    assert_eq!(report.parts_reused, 2);
    assert!(api.created_input("SCR-M4").is_none());
    assert!(api.link_between("FRAME-100", "SCR-M4").is_some());
}

#[test]
fn test_rejected_subassembly_reports_each_row() {
    let mut api = InMemoryPartsApi::new().reject_part("FRAME-100", "description too long");
    let report = run_import(read(ASSEMBLY_CSV), &mut api, ImportOptions::default()).unwrap();

    let lines: Vec<String> = report.outcomes.iter().map(|o| o.to_string()).collect();
    assert_eq!(lines[0], "[OK]   top level 0 CART-1");
    assert_eq!(lines[1], "[FAIL] row 2 level 1 FRAME-100: description too long");
    assert_eq!(lines[2], "[FAIL] row 3 level 2 BRKT-7: parent unresolved");
    assert_eq!(lines[3], "[FAIL] row 4 level 3 SCR-M4: parent unresolved");
    assert_eq!(lines[4], "[FAIL] row 5 level 2 SCR-M4: parent unresolved");
    assert_eq!(lines[5], "[OK]   row 6 level 1 PANEL-3");
}

#[test]
fn test_duplicate_rows_are_reported_and_skipped() {
    let csv = "\
Item No.,Part Number,Qty
1,FRAME-100,1
1.1,BRKT-7,4
1.2,BRKT-7,4
1.2.1,NUT-M4,4
2,PANEL-3,2
";
    let mut api = InMemoryPartsApi::new();
    let report = run_import(read(csv), &mut api, ImportOptions::default()).unwrap();

    let failures: Vec<(usize, Option<FailureKind>)> =
        report.failures().map(|o| (o.row_number, o.failure)).collect();
    assert_eq!(
        failures,
        vec![
            (4, Some(FailureKind::DuplicatePartAtLevel)),
            (5, Some(FailureKind::DiscardedWithDuplicate)),
        ]
    );
    assert!(api.part("NUT-M4").is_none());
    assert_eq!(api.link_between("FRAME-100", "BRKT-7").unwrap().quantity, 4.0);
}

#[test]
fn test_second_top_level_part_aborts_before_remote_calls() {
    let csv = "\
Level,Part Number,Qty
0,CART-1,1
1,FRAME-100,1
0,CART-2,1
";
    let rows = BomReader::new()
        .with_level_format(LevelFormat::Depth)
        .parse_bytes("cart.csv", csv.as_bytes(), None)
        .unwrap()
        .rows;
    let mut api = InMemoryPartsApi::new();

    let aborted = run_import(rows, &mut api, ImportOptions::default()).unwrap_err();

    assert_eq!(aborted.error.error_code(), "MALFORMED_HIERARCHY");
    assert_eq!(api.calls().find_parts + api.calls().find_part, 0);
}

#[test]
fn test_lost_credentials_abort_the_run() {
    let mut api = InMemoryPartsApi::new()
        .fault_on("PANEL-3", RemoteError::Unauthorized("token expired".to_string()));
    let aborted = run_import(
        read(ASSEMBLY_CSV),
        &mut api,
        ImportOptions { prefetch_existing: false },
    )
    .unwrap_err();

    assert_eq!(aborted.error.error_code(), "AUTHENTICATION_ERROR");
    assert_eq!(aborted.partial.outcomes.len(), 5);
    assert!(aborted.partial.outcomes.iter().all(|o| o.is_success()));
}
