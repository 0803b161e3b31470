//! Field mapping from scraped quotes to the remote table schema.
//!
//! [`map`] is a pure function: the same [`RawRecord`] always yields the same
//! [`CanonicalRecord`]. Conversion failures are returned to the caller, who
//! picks a [`MappingPolicy`] for the batch.

use crate::{
    error::Result,
    record::{fields, BondType, CanonicalRecord, RawNumber, RawRecord},
    Error, Timestamp,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What to do with a batch when one record fails to map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingPolicy {
    /// Fail the whole batch on the first bad record (default)
    #[default]
    Abort,
    /// Drop bad records and report them
    Skip,
}

impl std::str::FromStr for MappingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(MappingPolicy::Abort),
            "skip" => Ok(MappingPolicy::Skip),
            other => Err(format!("unknown mapping policy: {}", other)),
        }
    }
}

/// A record that failed to map, with its position in the input batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFailure {
    pub index: usize,
    pub error: Error,
}

/// Outcome of mapping a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedBatch {
    pub records: Vec<CanonicalRecord>,
    /// Records dropped under [`MappingPolicy::Skip`]
    pub skipped: Vec<MappingFailure>,
}

/// Convert one raw record into the table schema.
pub fn map(raw: &RawRecord) -> Result<CanonicalRecord> {
    let code = required(raw.bond_id.as_deref(), "bond_id")?;
    let name = required(raw.bond_nm.as_deref(), "bond_nm")?;
    let price = number(raw.price.as_ref(), "price")?;
    let premium = number(raw.premium_rt.as_ref(), "premium_rt")? / 100.0;
    let double_low = number(raw.dblow.as_ref(), "dblow")?;
    let years_left = number(raw.year_left.as_ref(), "year_left")?;
    let maturity = maturity_millis(required(
        raw.short_maturity_dt.as_deref(),
        "short_maturity_dt",
    )?)?;
    let bond_type = BondType::from_discriminator(raw.btype.as_deref());

    Ok(CanonicalRecord::new()
        .with(fields::CODE, code)
        .with(fields::NAME, name)
        .with(fields::PRICE, price)
        .with(fields::PREMIUM_RATE, premium)
        .with(fields::DOUBLE_LOW, double_low)
        .with(fields::BOND_TYPE, bond_type.label())
        .with(fields::YEARS_LEFT, years_left)
        .with(fields::MATURITY, maturity))
}

/// Map a batch under the given policy.
///
/// With [`MappingPolicy::Abort`] the first failure is returned together with
/// the index of the offending record.
pub fn map_all(
    raws: &[RawRecord],
    policy: MappingPolicy,
) -> std::result::Result<MappedBatch, MappingFailure> {
    let mut batch = MappedBatch {
        records: Vec::with_capacity(raws.len()),
        skipped: Vec::new(),
    };

    for (index, raw) in raws.iter().enumerate() {
        match map(raw) {
            Ok(record) => batch.records.push(record),
            Err(error) => match policy {
                MappingPolicy::Abort => return Err(MappingFailure { index, error }),
                MappingPolicy::Skip => batch.skipped.push(MappingFailure { index, error }),
            },
        }
    }

    Ok(batch)
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    value.ok_or(Error::MissingField(field))
}

fn number(value: Option<&RawNumber>, field: &'static str) -> Result<f64> {
    match value.ok_or(Error::MissingField(field))? {
        RawNumber::Number(n) => Ok(*n),
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| Error::InvalidNumber {
                field,
                value: s.clone(),
            }),
    }
}

/// Parse a `YY-MM-DD` maturity date as 20YY, UTC midnight, in milliseconds.
fn maturity_millis(short_date: &str) -> Result<Timestamp> {
    let full = format!("20{}", short_date.trim());
    let date = NaiveDate::parse_from_str(&full, "%Y-%m-%d").map_err(|_| Error::InvalidDate {
        field: "short_maturity_dt",
        value: short_date.to_string(),
    })?;

    Ok(date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default())
}
