//! Typed failures raised by the ingestion and validation layers.
//!
//! Command handlers wrap these in `anyhow` with context; library callers can
//! match on them directly.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Which table a record came from when a structural problem is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSide {
    Listing,
    Supporting,
}

impl fmt::Display for RecordSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSide::Listing => write!(f, "listing"),
            RecordSide::Supporting => write!(f, "supporting"),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to decode text with encoding {encoding}")]
pub struct DecodeError {
    pub encoding: &'static str,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("opening {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reading CSV {} at row {row}: {source}", path.display())]
    Csv {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("decoding {} at row {row}: {source}", path.display())]
    Decode {
        path: PathBuf,
        row: usize,
        #[source]
        source: DecodeError,
    },
    #[error("parsing JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("JSON document {} is not tabular: {reason}", path.display())]
    JsonShape { path: PathBuf, reason: String },
    #[error("reading workbook {}: {source}", path.display())]
    Excel {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {} has no sheet named '{sheet}'", path.display())]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("workbook {} contains no sheets", path.display())]
    EmptyWorkbook { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum VouchError {
    /// Every supporting source was skipped, so no union could be built.
    #[error("no usable supporting data: none of the supporting documents could be loaded")]
    NoUsableSupportingData,
    #[error("listing row {row}: {side} record is missing field '{field}'")]
    MissingField {
        row: usize,
        side: RecordSide,
        field: String,
    },
    #[error(transparent)]
    Ingest(#[from] IngestError),
}
