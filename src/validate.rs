use std::fmt;

use log::{debug, info};

use crate::{
    config::MissingFieldPolicy,
    data::Value,
    error::VouchError,
    matcher::{MatchRules, RowMatcher, Verdict},
    table::Table,
};

pub const STATUS_COLUMN: &str = "Validation Status";
pub const COMMENTS_COLUMN: &str = "Comments";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Match,
    Mismatch,
    NotFound,
    /// The row could not be compared because a needed field is absent.
    Error,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Match => "Match",
            ValidationStatus::Mismatch => "Mismatch",
            ValidationStatus::NotFound => "Not Found",
            ValidationStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Verdict> for ValidationStatus {
    fn from(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Match => ValidationStatus::Match,
            Verdict::Mismatch(_) => ValidationStatus::Mismatch,
            Verdict::NotFound => ValidationStatus::NotFound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub status: ValidationStatus,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub rows: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub not_found: usize,
    pub errors: usize,
    pub indeterminate_comparisons: usize,
}

impl ValidationSummary {
    fn record(&mut self, status: ValidationStatus) {
        self.rows += 1;
        match status {
            ValidationStatus::Match => self.matched += 1,
            ValidationStatus::Mismatch => self.mismatched += 1,
            ValidationStatus::NotFound => self.not_found += 1,
            ValidationStatus::Error => self.errors += 1,
        }
    }
}

/// The listing with `Validation Status` and `Comments` appended per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationTable {
    pub table: Table,
    pub outcomes: Vec<RowOutcome>,
    pub summary: ValidationSummary,
}

/// Validates every listing row, in order, against the supporting pool.
///
/// Neither input is modified. Under [`MissingFieldPolicy::Abort`] the first
/// row that needs an absent field fails the whole run; under
/// [`MissingFieldPolicy::Annotate`] that row is marked `Error` instead.
pub fn validate(
    listing: &Table,
    pool: &Table,
    rules: &MatchRules,
    policy: MissingFieldPolicy,
) -> Result<ValidationTable, VouchError> {
    let matcher = RowMatcher::new(pool, rules);
    let mut summary = ValidationSummary::default();
    let mut outcomes = Vec::with_capacity(listing.len());

    for (row_idx, record) in listing.records().enumerate() {
        let outcome = match matcher.match_record(&record) {
            Ok(row_match) => {
                summary.indeterminate_comparisons += row_match.indeterminate;
                RowOutcome {
                    status: ValidationStatus::from(&row_match.verdict),
                    comment: row_match.verdict.comment(),
                }
            }
            Err(missing) => match policy {
                MissingFieldPolicy::Abort => {
                    return Err(VouchError::MissingField {
                        row: row_idx + 1,
                        side: missing.side,
                        field: missing.field,
                    });
                }
                MissingFieldPolicy::Annotate => RowOutcome {
                    status: ValidationStatus::Error,
                    comment: missing.to_string(),
                },
            },
        };
        debug!("Listing row {}: {}", row_idx + 1, outcome.status);
        summary.record(outcome.status);
        outcomes.push(outcome);
    }

    let mut headers = listing.headers().to_vec();
    headers.push(STATUS_COLUMN.to_string());
    headers.push(COMMENTS_COLUMN.to_string());
    let mut table = Table::new(headers);
    for (row, outcome) in listing.rows().iter().zip(&outcomes) {
        let mut annotated = row.clone();
        annotated.push(Some(Value::String(outcome.status.to_string())));
        annotated.push(Some(Value::String(outcome.comment.clone())));
        table.push_row(annotated);
    }

    info!(
        "Validated {} row(s): {} match, {} mismatch, {} not found, {} error",
        summary.rows, summary.matched, summary.mismatched, summary.not_found, summary.errors
    );
    if summary.indeterminate_comparisons > 0 {
        info!(
            "{} comparison(s) could not be evaluated because a value was blank or unparsable",
            summary.indeterminate_comparisons
        );
    }

    Ok(ValidationTable {
        table,
        outcomes,
        summary,
    })
}
