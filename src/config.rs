//! Run configuration: which fields to compare, how loosely, and what to do
//! when a record lacks one of them.
//!
//! Values come from an optional YAML file and are then overridden by CLI
//! flags.

use std::{fs, path::Path, str::FromStr};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_KEY_FIELD: &str = "Invoice Number";
pub const DEFAULT_AMOUNT_FIELD: &str = "Amount";
pub const DEFAULT_DATE_FIELD: &str = "Date";
pub const DEFAULT_LISTING_SHEET: &str = "Listing";

pub fn default_amount_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    pub key: String,
    pub amount: String,
    pub date: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY_FIELD.to_string(),
            amount: DEFAULT_AMOUNT_FIELD.to_string(),
            date: DEFAULT_DATE_FIELD.to_string(),
        }
    }
}

/// Handling of a listing row whose comparison needs a field that the
/// listing or the supporting pool does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "kebab-case")]
pub enum MissingFieldPolicy {
    /// Mark the row `Error` and keep going
    #[default]
    Annotate,
    /// Fail the whole run without producing a table
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VouchConfig {
    pub fields: FieldNames,
    pub amount_tolerance: Decimal,
    pub listing_sheet: String,
    pub day_first: bool,
    pub on_missing_field: MissingFieldPolicy,
}

impl Default for VouchConfig {
    fn default() -> Self {
        Self {
            fields: FieldNames::default(),
            amount_tolerance: default_amount_tolerance(),
            listing_sheet: DEFAULT_LISTING_SHEET.to_string(),
            day_first: false,
            on_missing_field: MissingFieldPolicy::default(),
        }
    }
}

/// Per-invocation overrides; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub key_field: Option<String>,
    pub amount_field: Option<String>,
    pub date_field: Option<String>,
    pub amount_tolerance: Option<Decimal>,
    pub listing_sheet: Option<String>,
    pub day_first: bool,
    pub on_missing_field: Option<MissingFieldPolicy>,
}

impl VouchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_str(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(key) = &overrides.key_field {
            self.fields.key = key.clone();
        }
        if let Some(amount) = &overrides.amount_field {
            self.fields.amount = amount.clone();
        }
        if let Some(date) = &overrides.date_field {
            self.fields.date = date.clone();
        }
        if let Some(tolerance) = overrides.amount_tolerance {
            self.amount_tolerance = tolerance;
        }
        if let Some(sheet) = &overrides.listing_sheet {
            self.listing_sheet = sheet.clone();
        }
        if overrides.day_first {
            self.day_first = true;
        }
        if let Some(policy) = overrides.on_missing_field {
            self.on_missing_field = policy;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount_tolerance.is_sign_negative() && !self.amount_tolerance.is_zero() {
            return Err(anyhow!(
                "Amount tolerance must not be negative (got {})",
                self.amount_tolerance
            ));
        }
        for (label, name) in [
            ("key", &self.fields.key),
            ("amount", &self.fields.amount),
            ("date", &self.fields.date),
        ] {
            if name.trim().is_empty() {
                return Err(anyhow!("The {label} field name cannot be empty"));
            }
        }
        Ok(())
    }
}

impl FromStr for VouchConfig {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}
