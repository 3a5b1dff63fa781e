mod common;

use chrono::NaiveDate;
use common::{TestWorkspace, float, text};
use doc_vouch::data::Value;
use doc_vouch::error::{IngestError, VouchError};
use doc_vouch::ingest::IngestOptions;
use doc_vouch::table::Table;
use doc_vouch::unify::{collect_supporting, unify};
use proptest::prelude::*;

const SUPPORT_CSV: &str = "\
Invoice Number,Amount,Date
INV-100,250.00,2024-01-05
INV-101,100.50,2024-02-01
INV-102,75.25,2024-02-10
";

#[test]
fn csv_and_workbook_sources_stack_into_one_pool() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("batch_a.csv", SUPPORT_CSV);
    let xlsx = workspace.write_invoice_workbook(
        "batch_b.xlsx",
        "Receipts",
        &[("INV-200", 12.5, (2024, 3, 1)), ("INV-201", 80.0, (2024, 3, 2))],
    );

    let support = collect_supporting(&[csv.clone(), xlsx.clone()], &IngestOptions::default())
        .expect("pool builds");

    assert_eq!(support.table.len(), 5);
    assert_eq!(support.table.headers(), &["Invoice Number", "Amount", "Date"]);
    assert_eq!(support.included, vec![(csv, 3), (xlsx, 2)]);
    assert!(support.skipped.is_empty());

    let keys = support
        .table
        .rows()
        .iter()
        .map(|row| row[0].clone())
        .collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            text("INV-100"),
            text("INV-101"),
            text("INV-102"),
            text("INV-200"),
            text("INV-201"),
        ]
    );
    assert_eq!(support.table.rows()[3][1], float(12.5));
    assert_eq!(
        support.table.rows()[3][2],
        Some(Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
    );
}

#[test]
fn unsupported_source_is_skipped_and_recorded() {
    let workspace = TestWorkspace::new();
    let csv = workspace.write("batch_a.csv", SUPPORT_CSV);
    let notes = workspace.write("notes.txt", "not tabular");

    let support = collect_supporting(&[notes.clone(), csv], &IngestOptions::default())
        .expect("remaining source is usable");

    assert_eq!(support.table.len(), 3);
    assert_eq!(support.skipped.len(), 1);
    assert_eq!(support.skipped[0].path, notes);
    assert!(matches!(
        support.skipped[0].reason,
        IngestError::UnsupportedFormat { .. }
    ));
}

#[test]
fn unreadable_sources_are_skipped_alongside_missing_files() {
    let workspace = TestWorkspace::new();
    let broken = workspace.write("broken.json", "{ not json");
    let missing = workspace.path().join("absent.csv");
    let csv = workspace.write("ok.csv", SUPPORT_CSV);

    let support = collect_supporting(&[broken, missing, csv], &IngestOptions::default())
        .expect("one source survives");
    assert_eq!(support.table.len(), 3);
    assert_eq!(support.skipped.len(), 2);
    assert!(matches!(support.skipped[0].reason, IngestError::Json { .. }));
    assert!(matches!(support.skipped[1].reason, IngestError::Io { .. }));
}

#[test]
fn no_usable_source_is_an_error() {
    let workspace = TestWorkspace::new();
    let notes = workspace.write("notes.txt", "not tabular");
    let err = collect_supporting(&[notes], &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, VouchError::NoUsableSupportingData));

    let empty: [&str; 0] = [];
    let err = collect_supporting(&empty, &IngestOptions::default()).unwrap_err();
    assert!(matches!(err, VouchError::NoUsableSupportingData));
}

#[test]
fn header_whitespace_is_trimmed_before_union() {
    let workspace = TestWorkspace::new();
    let padded = workspace.write(
        "padded.csv",
        " Invoice Number ,Amount , Date\nINV-1,1.00,2024-01-01\n",
    );
    let plain = workspace.write("plain.csv", "Invoice Number,Amount,Date\nINV-2,2.00,2024-01-02\n");
    let support = collect_supporting(&[padded, plain], &IngestOptions::default()).unwrap();
    assert_eq!(support.table.headers(), &["Invoice Number", "Amount", "Date"]);
    assert_eq!(support.table.len(), 2);
}

#[test]
fn headers_that_collide_after_trimming_stay_separate_columns() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "collide.csv",
        "Invoice Number,Amount,Amount \nINV-1,1.00,2.00\n",
    );
    let support = collect_supporting(&[path], &IngestOptions::default()).unwrap();
    assert_eq!(
        support.table.headers(),
        &["Invoice Number", "Amount", "Amount.1"]
    );
    assert_eq!(support.table.rows()[0], vec![text("INV-1"), float(1.0), float(2.0)]);
}

#[test]
fn differing_schemas_union_with_null_fill() {
    let first = Table::from_rows(
        vec!["Invoice Number".into(), "Amount".into()],
        vec![vec![text("A"), float(1.0)]],
    );
    let second = Table::from_rows(
        vec!["Vendor".into(), "Invoice Number".into()],
        vec![vec![text("Acme"), text("B")]],
    );
    let unified = unify(vec![first, second]).unwrap();
    assert_eq!(unified.headers(), &["Invoice Number", "Amount", "Vendor"]);
    assert_eq!(
        unified.rows(),
        &[
            vec![text("A"), float(1.0), None],
            vec![text("B"), None, text("Acme")],
        ]
    );
}

#[test]
fn duplicates_are_kept() {
    let table = Table::from_rows(vec!["Invoice Number".into()], vec![vec![text("A")]]);
    let unified = unify(vec![table.clone(), table]).unwrap();
    assert_eq!(unified.len(), 2);
}

fn arb_table() -> impl Strategy<Value = Table> {
    let columns = ["Invoice Number", "Amount", "Date", "Vendor", "Memo"];
    (
        proptest::sample::subsequence(columns.to_vec(), 1..=columns.len()),
        0usize..6,
    )
        .prop_flat_map(|(headers, rows)| {
            let width = headers.len();
            (
                Just(headers),
                proptest::collection::vec(
                    proptest::collection::vec(proptest::option::of(-1000i64..1000), width),
                    rows,
                ),
            )
        })
        .prop_map(|(headers, rows)| {
            Table::from_rows(
                headers.into_iter().map(str::to_string).collect(),
                rows.into_iter()
                    .map(|row| row.into_iter().map(|cell| cell.map(Value::Integer)).collect())
                    .collect(),
            )
        })
}

proptest! {
    #[test]
    fn union_keeps_every_record_and_every_column(tables in proptest::collection::vec(arb_table(), 1..5)) {
        let unified = unify(tables.clone()).unwrap();
        let expected_rows: usize = tables.iter().map(Table::len).sum();
        prop_assert_eq!(unified.len(), expected_rows);

        for table in &tables {
            for header in table.headers() {
                prop_assert!(unified.column_index(header).is_some());
            }
        }

        let mut offset = 0;
        for table in &tables {
            for (row_idx, row) in table.rows().iter().enumerate() {
                let unified_row = &unified.rows()[offset + row_idx];
                for (header, unified_cell) in unified.headers().iter().zip(unified_row) {
                    match table.column_index(header) {
                        Some(col) => prop_assert_eq!(unified_cell, &row[col]),
                        None => prop_assert!(unified_cell.is_none()),
                    }
                }
            }
            offset += table.len();
        }
    }
}
