//! Plain-text grid rendering for terminal previews.

use std::fmt::Write as _;

use crate::table::Table;

const COLUMN_GAP: &str = "  ";

/// Renders the headers and up to `limit` rows of `table`.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let rows = table.display_rows().into_iter().take(limit).collect::<Vec<_>>();
    render_grid(table.headers(), &rows)
}

pub fn print_preview(table: &Table, limit: usize) {
    print!("{}", render_preview(table, limit));
}

pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let headers = headers.iter().map(|h| flatten_cell(h)).collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| flatten_cell(cell)).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| h.chars().count().max(3)).collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let mut output = String::new();
    let _ = writeln!(output, "{}", format_line(&headers, &widths));
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(idx, &width)| {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            format!("{cell:<width$}")
        })
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

fn flatten_cell(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
