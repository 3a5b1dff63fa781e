//! Per-row candidate search and tolerance comparison.
//!
//! Candidates are located through a [`CandidateIndex`] built once over the
//! supporting pool, then examined in pool order until one satisfies both the
//! amount and the date predicate.

use std::{collections::HashMap, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use log::debug;
use rust_decimal::Decimal;

use crate::{
    config::{FieldNames, VouchConfig},
    data::{Value, calendar_date, decimal_amount},
    error::RecordSide,
    table::{Record, Table},
};

pub const VALIDATED_COMMENT: &str = "Validated";
pub const NOT_FOUND_COMMENT: &str = "No supporting document found";

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRules {
    pub fields: FieldNames,
    pub amount_tolerance: Decimal,
    pub day_first: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        MatchRules::from(&VouchConfig::default())
    }
}

impl From<&VouchConfig> for MatchRules {
    fn from(config: &VouchConfig) -> Self {
        Self {
            fields: config.fields.clone(),
            amount_tolerance: config.amount_tolerance,
            day_first: config.day_first,
        }
    }
}

/// Normalized business-key value. Integral floats fold onto integers so
/// that `100` and `100.0` meet; strings never equal numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchKey {
    Text(String),
    Integer(i64),
    Float(u64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl MatchKey {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(MatchKey::Text(s.clone())),
            Value::Integer(i) => Some(MatchKey::Integer(*i)),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e18 => {
                Some(MatchKey::Integer(*f as i64))
            }
            Value::Float(f) => Some(MatchKey::Float(f.to_bits())),
            Value::Boolean(b) => Some(MatchKey::Boolean(*b)),
            Value::Date(d) => Some(MatchKey::Date(*d)),
            Value::DateTime(dt) => Some(MatchKey::DateTime(*dt)),
        }
    }
}

/// Maps each key to the pool rows carrying it, in pool order. Null keys are
/// not indexed.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    buckets: HashMap<MatchKey, Vec<usize>>,
}

impl CandidateIndex {
    /// `None` when the pool has no such key column.
    pub fn build(pool: &Table, key_field: &str) -> Option<Self> {
        let column = pool.column_index(key_field)?;
        let mut buckets: HashMap<MatchKey, Vec<usize>> = HashMap::new();
        for (row_idx, row) in pool.rows().iter().enumerate() {
            if let Some(key) = row[column].as_ref().and_then(MatchKey::from_value) {
                buckets.entry(key).or_default().push(row_idx);
            }
        }
        Some(Self { buckets })
    }

    pub fn candidates(&self, key: &MatchKey) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Outcome of one predicate. Only `Match` satisfies it; `Indeterminate`
/// means at least one side was null or could not be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Match,
    NoMatch,
    Indeterminate,
}

impl Comparison {
    pub fn is_match(self) -> bool {
        self == Comparison::Match
    }
}

pub fn compare_amounts(
    listing: Option<&Value>,
    supporting: Option<&Value>,
    tolerance: Decimal,
) -> Comparison {
    match (
        listing.and_then(decimal_amount),
        supporting.and_then(decimal_amount),
    ) {
        (Some(left), Some(right)) if (left - right).abs() <= tolerance => Comparison::Match,
        (Some(_), Some(_)) => Comparison::NoMatch,
        _ => Comparison::Indeterminate,
    }
}

pub fn compare_dates(
    listing: Option<&Value>,
    supporting: Option<&Value>,
    day_first: bool,
) -> Comparison {
    let parse = |value: Option<&Value>| value.and_then(|v| calendar_date(v, day_first));
    match (parse(listing), parse(supporting)) {
        (Some(left), Some(right)) if left == right => Comparison::Match,
        (Some(_), Some(_)) => Comparison::NoMatch,
        _ => Comparison::Indeterminate,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amount,
    Date,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Amount => write!(f, "Amount"),
            Field::Date => write!(f, "Date"),
        }
    }
}

/// One failing predicate on one candidate, rendered `Amount: X vs Y`.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub field: Field,
    pub listing: Option<Value>,
    pub supporting: Option<Value>,
    pub comparison: Comparison,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} vs {}",
            self.field,
            note_value(self.listing.as_ref()),
            note_value(self.supporting.as_ref())
        )
    }
}

fn note_value(value: Option<&Value>) -> String {
    value
        .map(Value::as_display)
        .unwrap_or_else(|| "(blank)".to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Match,
    /// Notes from every candidate examined, in pool order.
    Mismatch(Vec<Discrepancy>),
    NotFound,
}

impl Verdict {
    pub fn comment(&self) -> String {
        match self {
            Verdict::Match => VALIDATED_COMMENT.to_string(),
            Verdict::Mismatch(notes) => notes.iter().join("; "),
            Verdict::NotFound => NOT_FOUND_COMMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowMatch {
    pub verdict: Verdict,
    pub candidates_examined: usize,
    /// Predicates that could not be evaluated on the examined candidates.
    pub indeterminate: usize,
}

/// A comparison needed a field that one of the tables does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub side: RecordSide,
    pub field: String,
}

impl MissingField {
    fn new(side: RecordSide, field: &str) -> Self {
        Self {
            side,
            field: field.to_string(),
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing field '{}' in {} record", self.field, self.side)
    }
}

pub struct RowMatcher<'a> {
    pool: &'a Table,
    index: Option<CandidateIndex>,
    rules: &'a MatchRules,
}

impl<'a> RowMatcher<'a> {
    pub fn new(pool: &'a Table, rules: &'a MatchRules) -> Self {
        let index = CandidateIndex::build(pool, &rules.fields.key);
        if let Some(index) = &index {
            debug!(
                "Indexed {} supporting row(s) under {} distinct key(s)",
                pool.len(),
                index.key_count()
            );
        }
        Self { pool, index, rules }
    }

    pub fn match_record(&self, record: &Record<'_>) -> Result<RowMatch, MissingField> {
        let fields = &self.rules.fields;
        let key = record
            .field(&fields.key)
            .ok_or_else(|| MissingField::new(RecordSide::Listing, &fields.key))?;
        let index = self
            .index
            .as_ref()
            .ok_or_else(|| MissingField::new(RecordSide::Supporting, &fields.key))?;

        let candidates = key
            .and_then(MatchKey::from_value)
            .map(|key| index.candidates(&key))
            .unwrap_or(&[]);
        if candidates.is_empty() {
            return Ok(RowMatch {
                verdict: Verdict::NotFound,
                candidates_examined: 0,
                indeterminate: 0,
            });
        }

        let listing_amount = record
            .field(&fields.amount)
            .ok_or_else(|| MissingField::new(RecordSide::Listing, &fields.amount))?;
        let listing_date = record
            .field(&fields.date)
            .ok_or_else(|| MissingField::new(RecordSide::Listing, &fields.date))?;

        let mut notes = Vec::new();
        let mut indeterminate = 0usize;
        for (examined, &row_idx) in candidates.iter().enumerate() {
            let Some(candidate) = self.pool.record(row_idx) else {
                continue;
            };
            let supporting_amount = candidate
                .field(&fields.amount)
                .ok_or_else(|| MissingField::new(RecordSide::Supporting, &fields.amount))?;
            let supporting_date = candidate
                .field(&fields.date)
                .ok_or_else(|| MissingField::new(RecordSide::Supporting, &fields.date))?;

            let amount = compare_amounts(
                listing_amount,
                supporting_amount,
                self.rules.amount_tolerance,
            );
            let date = compare_dates(listing_date, supporting_date, self.rules.day_first);
            debug!("Candidate row {row_idx}: amount {amount:?}, date {date:?}");
            indeterminate += [amount, date]
                .iter()
                .filter(|outcome| **outcome == Comparison::Indeterminate)
                .count();

            if amount.is_match() && date.is_match() {
                return Ok(RowMatch {
                    verdict: Verdict::Match,
                    candidates_examined: examined + 1,
                    indeterminate,
                });
            }
            if !amount.is_match() {
                notes.push(Discrepancy {
                    field: Field::Amount,
                    listing: listing_amount.cloned(),
                    supporting: supporting_amount.cloned(),
                    comparison: amount,
                });
            }
            if !date.is_match() {
                notes.push(Discrepancy {
                    field: Field::Date,
                    listing: listing_date.cloned(),
                    supporting: supporting_date.cloned(),
                    comparison: date,
                });
            }
        }

        Ok(RowMatch {
            verdict: Verdict::Mismatch(notes),
            candidates_examined: candidates.len(),
            indeterminate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(raw: f64) -> Value {
        Value::Float(raw)
    }

    #[test]
    fn amounts_within_tolerance_match_inclusively() {
        let tolerance = Decimal::new(1, 2);
        assert_eq!(
            compare_amounts(Some(&amount(250.0)), Some(&amount(250.01)), tolerance),
            Comparison::Match
        );
        assert_eq!(
            compare_amounts(Some(&amount(99.99)), Some(&amount(100.5)), tolerance),
            Comparison::NoMatch
        );
        assert_eq!(
            compare_amounts(None, Some(&amount(1.0)), tolerance),
            Comparison::Indeterminate
        );
    }

    #[test]
    fn dates_compare_by_calendar_day() {
        let listing = Value::String("2024-01-05".into());
        let stamp = Value::String("2024-01-05 17:45:00".into());
        assert_eq!(compare_dates(Some(&listing), Some(&stamp), false), Comparison::Match);
        let other = Value::String("2024-01-06".into());
        assert_eq!(compare_dates(Some(&listing), Some(&other), false), Comparison::NoMatch);
        let junk = Value::String("soon".into());
        assert_eq!(
            compare_dates(Some(&listing), Some(&junk), false),
            Comparison::Indeterminate
        );
    }

    #[test]
    fn match_key_folds_integral_floats() {
        assert_eq!(
            MatchKey::from_value(&Value::Float(100.0)),
            MatchKey::from_value(&Value::Integer(100))
        );
        assert_ne!(
            MatchKey::from_value(&Value::String("100".into())),
            MatchKey::from_value(&Value::Integer(100))
        );
        assert_eq!(MatchKey::from_value(&Value::Float(f64::NAN)), None);
    }

    #[test]
    fn discrepancy_renders_blank_for_null_side() {
        let note = Discrepancy {
            field: Field::Amount,
            listing: Some(Value::Float(12.5)),
            supporting: None,
            comparison: Comparison::Indeterminate,
        };
        assert_eq!(note.to_string(), "Amount: 12.5 vs (blank)");
    }
}
