//! In-memory tabular model shared by every stage of a run.
//!
//! A [`Table`] is an ordered header list plus rows of equal width. A field is
//! *present* on a [`Record`] when the header list names it; a present field
//! may still hold a null cell.

use std::collections::HashSet;

use log::warn;

use crate::data::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Builds a table, padding short rows with nulls and dropping cells past
    /// the header width.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Option<Value>>>) -> Self {
        let mut table = Self::new(headers);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<Option<Value>>) {
        row.resize(self.headers.len(), None);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn record(&self, idx: usize) -> Option<Record<'_>> {
        self.rows.get(idx).map(|values| Record {
            headers: &self.headers,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(|values| Record {
            headers: &self.headers,
            values,
        })
    }

    /// Rows rendered as display strings, nulls as empty cells.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// Borrowed view of one row, addressed by field name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    values: &'a [Option<Value>],
}

impl<'a> Record<'a> {
    /// `None` when the field is absent from the schema, `Some(None)` when it
    /// is present but null.
    pub fn field(&self, name: &str) -> Option<Option<&'a Value>> {
        self.headers
            .iter()
            .position(|header| header == name)
            .map(|idx| self.values.get(idx).and_then(Option::as_ref))
    }
}

/// Trims leading and trailing whitespace from every field name. Names that
/// collide once trimmed get the same `.1`, `.2` suffixes as raw duplicates.
/// Row content is untouched.
pub fn normalize_headers(table: Table) -> Table {
    let Table { headers, rows } = table;
    let trimmed = headers
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    let deduped = dedupe_headers(trimmed.clone());
    for ((raw, plain), unique) in headers.iter().zip(&trimmed).zip(&deduped) {
        if plain != unique {
            warn!("Header {raw:?} collides with another column after trimming; renamed to {unique:?}");
        }
    }
    Table {
        headers: deduped,
        rows,
    }
}

/// Disambiguates repeated raw labels as `X`, `X.1`, `X.2`, ...
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .into_iter()
        .map(|header| {
            let mut candidate = header.clone();
            let mut counter = 1usize;
            while seen.contains(&candidate) {
                candidate = format!("{header}.{counter}");
                counter += 1;
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}
