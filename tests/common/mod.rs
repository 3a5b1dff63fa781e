#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use doc_vouch::data::Value;
use doc_vouch::table::Table;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a single-sheet workbook of invoice rows `(key, amount, yyyy-mm-dd)`.
    pub fn write_invoice_workbook(
        &self,
        name: &str,
        sheet: &str,
        rows: &[(&str, f64, (u16, u8, u8))],
    ) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).expect("sheet name");
        for (col, header) in ["Invoice Number ", "Amount", " Date"].iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }
        for (idx, (key, amount, (year, month, day))) in rows.iter().enumerate() {
            let row = (idx + 1) as u32;
            worksheet.write_string(row, 0, *key).expect("write key");
            worksheet.write_number(row, 1, *amount).expect("write amount");
            let date = ExcelDateTime::from_ymd(*year, *month, *day).expect("valid date");
            worksheet
                .write_datetime_with_format(row, 2, &date, &date_format)
                .expect("write date");
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

pub fn text(value: &str) -> Option<Value> {
    Some(Value::String(value.to_string()))
}

pub fn float(value: f64) -> Option<Value> {
    Some(Value::Float(value))
}

/// Invoice table with the standard three fields; dates are kept as text.
pub fn invoices(rows: &[(&str, Option<f64>, &str)]) -> Table {
    Table::from_rows(
        vec!["Invoice Number".into(), "Amount".into(), "Date".into()],
        rows.iter()
            .map(|(key, amount, date)| {
                vec![
                    text(key),
                    amount.map(Value::Float),
                    if date.is_empty() { None } else { text(date) },
                ]
            })
            .collect(),
    )
}
