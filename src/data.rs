use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;

/// A single scalar cell. Absent/null cells are modelled as `Option<Value>::None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Boolean(true) => "True".to_string(),
            Value::Boolean(false) => "False".to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Shortest round-trip rendering that always keeps a fractional part
/// (`250.0`, `100.5`) so integral floats stay distinguishable from integers.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Tokens read as null when typing text sources.
pub const NULL_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "#N/A", "<NA>",
];

pub fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
}

#[derive(Debug, Clone, Copy)]
struct TypeCandidate {
    integer: bool,
    float: bool,
    boolean: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            integer: true,
            float: true,
            boolean: true,
        }
    }

    fn observe(&mut self, raw: &str) {
        let numeric_shape = !has_redundant_leading_zero(raw);
        if self.integer {
            self.integer = numeric_shape && raw.parse::<i64>().is_ok();
        }
        if self.float {
            self.float = numeric_shape && raw.parse::<f64>().is_ok_and(f64::is_finite);
        }
        if self.boolean {
            self.boolean = parse_boolean(raw).is_some();
        }
    }

    fn decide(&self, observed: usize) -> ColumnType {
        if observed == 0 {
            ColumnType::String
        } else if self.integer {
            ColumnType::Integer
        } else if self.float {
            ColumnType::Float
        } else if self.boolean {
            ColumnType::Boolean
        } else {
            ColumnType::String
        }
    }
}

fn has_redundant_leading_zero(raw: &str) -> bool {
    let digits = raw.trim_start_matches(['+', '-']);
    let integral = digits.split(['.', 'e', 'E']).next().unwrap_or("");
    integral.len() > 1 && integral.starts_with('0')
}

fn parse_boolean(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Picks one type for a whole text column from its non-null cells.
pub fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidate = TypeCandidate::new();
    let mut observed = 0usize;
    for raw in cells {
        if is_null_token(raw) {
            continue;
        }
        observed += 1;
        candidate.observe(raw.trim());
    }
    candidate.decide(observed)
}

pub fn parse_cell(raw: &str, ty: ColumnType) -> Option<Value> {
    if is_null_token(raw) {
        return None;
    }
    let trimmed = raw.trim();
    match ty {
        ColumnType::Integer => trimmed.parse().ok().map(Value::Integer),
        ColumnType::Float => trimmed.parse().ok().map(Value::Float),
        ColumnType::Boolean => parse_boolean(trimmed).map(Value::Boolean),
        ColumnType::String => Some(Value::String(raw.to_string())),
    }
}

/// Types raw text rows column by column, the way delimited sources are read.
pub fn type_text_rows(width: usize, raw_rows: &[Vec<String>]) -> Vec<Vec<Option<Value>>> {
    let column_types = (0..width)
        .map(|idx| {
            infer_column_type(
                raw_rows
                    .iter()
                    .map(|row| row.get(idx).map(String::as_str).unwrap_or("")),
            )
        })
        .collect::<Vec<_>>();
    raw_rows
        .iter()
        .map(|row| {
            column_types
                .iter()
                .enumerate()
                .map(|(idx, ty)| parse_cell(row.get(idx).map(String::as_str).unwrap_or(""), *ty))
                .collect()
        })
        .collect()
}

const MONTH_FIRST_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y", "%d.%m.%Y",
    "%m/%d/%y", "%d/%m/%y", "%Y%m%d", "%d %b %Y", "%d %B %Y", "%b %d %Y", "%B %d %Y",
    "%b %d, %Y", "%B %d, %Y",
];

const DAY_FIRST_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%m-%d-%Y", "%d.%m.%Y",
    "%d/%m/%y", "%m/%d/%y", "%Y%m%d", "%d %b %Y", "%d %B %Y", "%b %d %Y", "%B %d %Y",
    "%b %d, %Y", "%B %d, %Y",
];

const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %I:%M %p",
];

pub fn parse_naive_date(value: &str, day_first: bool) -> Option<NaiveDate> {
    let formats = if day_first {
        DAY_FIRST_DATE_FORMATS
    } else {
        MONTH_FIRST_DATE_FORMATS
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn parse_naive_datetime(value: &str, day_first: bool) -> Option<NaiveDateTime> {
    let formats = if day_first {
        DAY_FIRST_DATETIME_FORMATS
    } else {
        MONTH_FIRST_DATETIME_FORMATS
    };
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Calendar date of a cell, ignoring time of day. `None` means the value is
/// not date-like at all.
pub fn calendar_date(value: &Value, day_first: bool) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::String(s) => {
            let trimmed = s.trim();
            parse_naive_date(trimmed, day_first)
                .or_else(|| parse_naive_datetime(trimmed, day_first).map(|dt| dt.date()))
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => None,
    }
}

/// Exact decimal form of a monetary cell.
pub fn decimal_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(i) => Some(Decimal::from(*i)),
        Value::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string()).ok(),
        Value::String(s) => {
            let cleaned = s.trim().replace(',', "");
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

/// Converts an Excel 1900-system serial into a date, or a datetime when the
/// serial carries a time of day.
pub fn excel_serial_to_value(serial: f64) -> Option<Value> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (serial * 86_400_000.0).round() as i64;
    let moment = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    if moment.time() == NaiveTime::MIN {
        Some(Value::Date(moment.date()))
    } else {
        Some(Value::DateTime(moment))
    }
}
