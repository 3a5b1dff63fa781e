use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{
    error::{IngestError, VouchError},
    ingest::{self, IngestOptions},
    table::{Table, normalize_headers},
};

/// A supporting source left out of the union, with the reason it failed.
#[derive(Debug)]
pub struct SkippedSource {
    pub path: PathBuf,
    pub reason: IngestError,
}

#[derive(Debug)]
pub struct UnifiedSupport {
    pub table: Table,
    /// Row count contributed by each source that made it into the union.
    pub included: Vec<(PathBuf, usize)>,
    pub skipped: Vec<SkippedSource>,
}

/// Loads every supporting source, normalizes its headers and concatenates
/// the results. Sources that cannot be read are warned about and skipped.
pub fn collect_supporting<P>(paths: &[P], options: &IngestOptions) -> Result<UnifiedSupport, VouchError>
where
    P: AsRef<Path>,
{
    let mut tables = Vec::with_capacity(paths.len());
    let mut included = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match ingest::load_table(path, options) {
            Ok(table) => {
                info!("✓ Loaded {} row(s) from {:?}", table.len(), path);
                included.push((path.to_path_buf(), table.len()));
                tables.push(normalize_headers(table));
            }
            Err(reason) => {
                warn!("Skipping supporting document {:?}: {}", path, reason);
                skipped.push(SkippedSource {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        }
    }

    let table = unify(tables)?;
    Ok(UnifiedSupport {
        table,
        included,
        skipped,
    })
}

/// Concatenates normalized tables in input order without deduplication.
///
/// The resulting schema is the first-seen union of all headers; a record
/// lacking a column gets a null cell for it.
pub fn unify(tables: Vec<Table>) -> Result<Table, VouchError> {
    if tables.is_empty() {
        return Err(VouchError::NoUsableSupportingData);
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut headers: Vec<String> = Vec::new();
    for table in &tables {
        for header in table.headers() {
            if !positions.contains_key(header) {
                positions.insert(header.clone(), headers.len());
                headers.push(header.clone());
            }
        }
    }

    let mut unified = Table::new(headers);
    let width = unified.headers().len();
    for table in tables {
        let mapping = table
            .headers()
            .iter()
            .map(|header| positions[header])
            .collect::<Vec<_>>();
        for row in table.rows() {
            let mut target = vec![None; width];
            for (source_idx, cell) in row.iter().enumerate() {
                let target_idx = mapping[source_idx];
                if target[target_idx].is_none() {
                    target[target_idx] = cell.clone();
                }
            }
            unified.push_row(target);
        }
    }
    Ok(unified)
}
