mod common;

use assert_cmd::Command;
use common::{TestWorkspace, float, text};
use doc_vouch::preview::{render_grid, render_preview};
use doc_vouch::table::Table;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

#[test]
fn grid_aligns_columns_and_flattens_line_breaks() {
    let rendered = render_grid(
        &strings(&["Status", "Comments"]),
        &[
            strings(&["Match", "Validated"]),
            strings(&["Not Found", "No supporting\ndocument"]),
        ],
    );
    let lines = rendered.lines().collect::<Vec<_>>();
    assert_eq!(
        lines,
        vec![
            "Status     Comments",
            "---------  ----------------------",
            "Match      Validated",
            "Not Found  No supporting document",
        ]
    );
}

#[test]
fn narrow_columns_get_a_minimum_width() {
    let rendered = render_grid(&strings(&["A", "B"]), &[strings(&["1", "2"])]);
    assert_eq!(rendered, "A    B\n---  ---\n1    2\n");
}

#[test]
fn preview_limits_rows_and_blanks_nulls() {
    let table = Table::from_rows(
        vec!["Invoice Number".into(), "Amount".into()],
        vec![
            vec![text("INV-1"), None],
            vec![text("INV-2"), float(2.0)],
            vec![text("INV-3"), float(3.0)],
        ],
    );
    let rendered = render_preview(&table, 2);
    let lines = rendered.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[2], "INV-1");
    assert_eq!(lines[3], format!("{:<14}  {}", "INV-2", "2.0"));
    assert!(!rendered.contains("INV-3"));

    assert_eq!(render_preview(&table, 0).lines().count(), 2);
}

#[test]
fn preview_command_prints_first_rows_of_a_workbook() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_invoice_workbook(
        "receipts.xlsx",
        "Receipts",
        &[("INV-200", 12.5, (2024, 3, 1)), ("INV-201", 80.0, (2024, 3, 2))],
    );
    Command::cargo_bin("doc-vouch")
        .expect("binary exists")
        .args(["preview", "-i", path.to_str().unwrap(), "--rows", "1"])
        .assert()
        .success()
        .stdout(contains("Invoice Number"))
        .stdout(contains("INV-200"))
        .stdout(contains("2024-03-01"))
        .stdout(contains("INV-201").not());
}

#[test]
fn preview_command_reports_unsupported_input() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("notes.txt", "hello");
    Command::cargo_bin("doc-vouch")
        .expect("binary exists")
        .args(["preview", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("unsupported file type"));
}
