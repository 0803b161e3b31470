//! Record types flowing through a reconciliation pass.

use crate::{Code, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column names of the remote table.
pub mod fields {
    /// Bond code, the business key.
    pub const CODE: &str = "代码";
    pub const NAME: &str = "转债名称";
    pub const PRICE: &str = "现价";
    /// Conversion premium as a fraction (0.125 for 12.5%).
    pub const PREMIUM_RATE: &str = "转股溢价率";
    pub const DOUBLE_LOW: &str = "双低";
    pub const BOND_TYPE: &str = "债券类型";
    pub const YEARS_LEFT: &str = "剩余年限";
    /// Maturity date in milliseconds since epoch.
    pub const MATURITY: &str = "到期时间";
}

/// A numeric field as the upstream producer sends it.
///
/// The quote feed mixes JSON numbers and numeric strings (`"112.30"`), so
/// both shapes are accepted at deserialization time and parsed by the mapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

/// One scraped bond observation.
///
/// Every field is optional on the wire; the mapper decides which ones are
/// required and reports the first one missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub bond_id: Option<String>,
    pub bond_nm: Option<String>,
    pub price: Option<RawNumber>,
    /// Conversion premium in whole percent.
    pub premium_rt: Option<RawNumber>,
    pub dblow: Option<RawNumber>,
    /// `"E"` for exchangeable bonds, anything else for convertibles.
    pub btype: Option<String>,
    pub year_left: Option<RawNumber>,
    /// Maturity date without the century, e.g. `"26-03-15"`.
    pub short_maturity_dt: Option<String>,
}

/// Kind of bond, rendered as the table's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondType {
    Convertible,
    Exchangeable,
}

impl BondType {
    /// Translate the feed's discriminator. Unknown values fall back to
    /// [`BondType::Convertible`].
    pub fn from_discriminator(btype: Option<&str>) -> Self {
        match btype {
            Some("E") => BondType::Exchangeable,
            _ => BondType::Convertible,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BondType::Convertible => "可转债",
            BondType::Exchangeable => "可交换债",
        }
    }
}

/// A row in the remote table's schema.
///
/// Field order follows insertion order so that payloads sent to the store
/// are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord {
    fields: Map<String, Value>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The business key. Missing or non-string codes read as `""`, which is
    /// still a valid key.
    pub fn code(&self) -> &str {
        self.fields
            .get(fields::CODE)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for CanonicalRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// A row currently stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Identifier assigned by the store
    pub record_id: RecordId,
    /// Row contents
    #[serde(default)]
    pub fields: CanonicalRecord,
}

impl RemoteEntry {
    pub fn new(record_id: impl Into<RecordId>, fields: CanonicalRecord) -> Self {
        Self {
            record_id: record_id.into(),
            fields,
        }
    }

    pub fn code(&self) -> &str {
        self.fields.code()
    }
}

/// Collapse repeated codes in a target batch.
///
/// The last record seen for a code wins; it takes the position of the first
/// occurrence so create/update order stays close to the producer's order.
pub fn dedupe_by_code(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    let mut positions: std::collections::HashMap<Code, usize> =
        std::collections::HashMap::with_capacity(records.len());
    let mut out: Vec<CanonicalRecord> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(record.code()) {
            Some(&idx) => out[idx] = record,
            None => {
                positions.insert(record.code().to_string(), out.len());
                out.push(record);
            }
        }
    }

    out
}
