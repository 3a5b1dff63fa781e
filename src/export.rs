use std::{io::Write, path::Path};

use anyhow::{Context, Result};

use crate::{io_utils, table::Table};

pub const DEFAULT_OUTPUT_FILE: &str = "validation_table.csv";

pub fn write_table<W>(table: &Table, writer: &mut csv::Writer<W>) -> Result<()>
where
    W: Write,
{
    writer
        .write_record(table.headers())
        .context("Writing output headers")?;
    for (row_idx, row) in table.display_rows().iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing output row {}", row_idx + 1))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

/// Serializes a table as UTF-8 CSV text.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = io_utils::csv_writer(Vec::new(), io_utils::DEFAULT_CSV_DELIMITER);
    write_table(table, &mut writer)?;
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Finishing CSV buffer: {}", err.error()))
}

/// Writes a table to `path` (stdout for `None` or `-`). The delimiter is
/// tab for `.tsv` destinations and comma otherwise.
pub fn export_table(table: &Table, path: Option<&Path>) -> Result<()> {
    let delimiter = io_utils::resolve_output_delimiter(path, None);
    let mut writer = io_utils::open_csv_writer(path, delimiter)?;
    write_table(table, &mut writer)
}
