//! Reads listing and supporting documents into [`Table`]s.
//!
//! The reader is chosen by file extension: delimited text (`.csv`, `.tsv`),
//! JSON (`.json`) or a spreadsheet workbook (`.xlsx`, `.xlsm`, `.xlsb`,
//! `.xls`, `.ods`). Headers come back exactly as the source spells them;
//! trimming is [`crate::table::normalize_headers`]'s job.

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use calamine::{Data, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::debug;
use serde_json::{Map, Value as JsonValue};

use crate::{
    data::{Value, excel_serial_to_value, parse_naive_date, parse_naive_datetime, type_text_rows},
    error::IngestError,
    io_utils,
    table::{Table, dedupe_headers},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited { delimiter: u8 },
    Json,
    Workbook,
}

impl SourceFormat {
    pub fn detect(path: &Path, delimiter: Option<u8>) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv" | "tsv") => Ok(SourceFormat::Delimited {
                delimiter: io_utils::resolve_input_delimiter(path, delimiter),
            }),
            Some("json") => Ok(SourceFormat::Json),
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Ok(SourceFormat::Workbook),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Overrides the extension-derived delimiter for text sources.
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    /// Worksheet to read; `None` reads the first sheet.
    pub sheet: Option<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sheet: None,
        }
    }
}

impl IngestOptions {
    pub fn with_sheet(&self, sheet: Option<String>) -> Self {
        Self {
            sheet,
            ..self.clone()
        }
    }
}

pub fn load_table(path: &Path, options: &IngestOptions) -> Result<Table, IngestError> {
    let format = SourceFormat::detect(path, options.delimiter)?;
    debug!("Reading {path:?} as {format:?}");
    match format {
        SourceFormat::Delimited { delimiter } => read_delimited(path, delimiter, options.encoding),
        SourceFormat::Json => read_json(path),
        SourceFormat::Workbook => read_workbook(path, options.sheet.as_deref()),
    }
}

fn read_delimited(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Table, IngestError> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let header_record = reader
        .byte_headers()
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            row: 1,
            source,
        })?
        .clone();
    let headers =
        io_utils::decode_record(&header_record, encoding).map_err(|source| IngestError::Decode {
            path: path.to_path_buf(),
            row: 1,
            source,
        })?;

    let mut raw_rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let row = row_idx + 2;
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            row,
            source,
        })?;
        let decoded =
            io_utils::decode_record(&record, encoding).map_err(|source| IngestError::Decode {
                path: path.to_path_buf(),
                row,
                source,
            })?;
        raw_rows.push(decoded);
    }

    let typed = type_text_rows(headers.len(), &raw_rows);
    Ok(Table::from_rows(dedupe_headers(headers), typed))
}

fn read_json(path: &Path) -> Result<Table, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: JsonValue =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    match document {
        JsonValue::Array(items) => json_records(path, items),
        JsonValue::Object(columns) => json_columns(path, columns),
        _ => Err(IngestError::JsonShape {
            path: path.to_path_buf(),
            reason: "expected an array of records or an object of columns".to_string(),
        }),
    }
}

/// `[{"col": v, ...}, ...]`
fn json_records(path: &Path, items: Vec<JsonValue>) -> Result<Table, IngestError> {
    let mut objects = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            JsonValue::Object(map) => objects.push(map),
            _ => {
                return Err(IngestError::JsonShape {
                    path: path.to_path_buf(),
                    reason: format!("record {idx} is not an object"),
                });
            }
        }
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !positions.contains_key(key) {
                positions.insert(key.clone(), headers.len());
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            let mut row = vec![None; headers.len()];
            for (key, value) in object {
                if let Some(&idx) = positions.get(key) {
                    row[idx] = json_to_value(value);
                }
            }
            row
        })
        .collect();
    Ok(Table::from_rows(headers, rows))
}

/// `{"col": [v, ...]}` or `{"col": {"row label": v, ...}}`
fn json_columns(path: &Path, columns: Map<String, JsonValue>) -> Result<Table, IngestError> {
    let mut label_positions: HashMap<String, usize> = HashMap::new();
    let mut column_cells: Vec<Vec<(usize, Option<Value>)>> = Vec::with_capacity(columns.len());
    let mut headers = Vec::with_capacity(columns.len());

    for (name, column) in columns {
        let labelled: Vec<(String, JsonValue)> = match column {
            JsonValue::Array(values) => values
                .into_iter()
                .enumerate()
                .map(|(idx, value)| (idx.to_string(), value))
                .collect(),
            JsonValue::Object(map) => map.into_iter().collect(),
            _ => {
                return Err(IngestError::JsonShape {
                    path: path.to_path_buf(),
                    reason: format!("column '{name}' is neither an array nor an object"),
                });
            }
        };
        let mut cells = Vec::with_capacity(labelled.len());
        for (label, value) in labelled {
            let next = label_positions.len();
            let position = *label_positions.entry(label).or_insert(next);
            cells.push((position, json_to_value(&value)));
        }
        column_cells.push(cells);
        headers.push(name);
    }

    let mut rows = vec![vec![None; headers.len()]; label_positions.len()];
    for (column_idx, cells) in column_cells.into_iter().enumerate() {
        for (row_idx, value) in cells {
            rows[row_idx][column_idx] = value;
        }
    }
    Ok(Table::from_rows(headers, rows))
}

fn json_to_value(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Boolean(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        JsonValue::String(s) => Some(Value::String(s.clone())),
        nested => Some(Value::String(nested.to_string())),
    }
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table, IngestError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| IngestError::Excel {
        path: path.to_path_buf(),
        source,
    })?;
    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|candidate| candidate == name) {
                return Err(IngestError::MissingSheet {
                    path: path.to_path_buf(),
                    sheet: name.to_string(),
                });
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IngestError::EmptyWorkbook {
                path: path.to_path_buf(),
            })?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|source| IngestError::Excel {
            path: path.to_path_buf(),
            source,
        })?;

    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(first) => first
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let label = cell.to_string();
                if label.trim().is_empty() {
                    format!("Unnamed: {idx}")
                } else {
                    label
                }
            })
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };

    let rows = rows_iter
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| cells.iter().map(cell_to_value).collect())
        .collect();
    debug!("Read sheet '{sheet_name}' from {path:?}");
    Ok(Table::from_rows(dedupe_headers(headers), rows))
}

/// Workbooks store every number as a float; whole values come back as
/// integers so they render as `250` rather than `250.0`.
fn workbook_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e18 {
        Value::Integer(value as i64)
    } else {
        Value::Float(value)
    }
}

fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Float(f) => Some(workbook_number(*f)),
        Data::Int(i) => Some(Value::Integer(*i)),
        Data::Bool(b) => Some(Value::Boolean(*b)),
        Data::DateTime(dt) => excel_serial_to_value(dt.as_f64()),
        Data::DateTimeIso(s) => Some(
            parse_naive_date(s, false)
                .map(Value::Date)
                .or_else(|| parse_naive_datetime(s, false).map(Value::DateTime))
                .unwrap_or_else(|| Value::String(s.clone())),
        ),
        Data::DurationIso(s) => Some(Value::String(s.clone())),
    }
}
