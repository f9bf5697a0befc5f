use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aggregate::StatsByEventCode;
use crate::config::CompareOptions;

// ---------------------------------------------------------------------------
// Well-known fields
// ---------------------------------------------------------------------------

pub const CASE_ID: &str = "CaseID";
pub const EVENT_CODE: &str = "EventCode";
pub const EVENT_NAME: &str = "EventName";
pub const MMWR_YEAR: &str = "MMWRYear";
pub const MMWR_WEEK: &str = "MMWRWeek";
pub const CASE_CLASS_STATUS: &str = "CaseClassStatus";
pub const ADD_TIME: &str = "add_time";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which dataset a record or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Authoritative,
    Secondary,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Authoritative => "authoritative",
            Side::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of either dataset: field name → string value, in column order.
///
/// Rows loaded from the same file share one column list. A row shorter than
/// its header simply lacks the trailing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    pub fn new(columns: Arc<[String]>, values: Vec<String>) -> Self {
        Self { columns, values }
    }

    /// Build a record from `(field, value)` pairs. Mostly for tests and
    /// callers that already hold parsed rows.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let (columns, values): (Vec<String>, Vec<String>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == field)?;
        self.values.get(idx).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Field names present on this record, in column order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .take(self.values.len())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn case_id(&self) -> &str {
        self.get(CASE_ID).unwrap_or("")
    }

    pub fn event_code(&self) -> &str {
        self.get(EVENT_CODE).unwrap_or("")
    }

    pub fn event_name(&self) -> &str {
        self.get(EVENT_NAME).unwrap_or("")
    }
}

/// Pre-loaded records for one comparison run, in source order.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub authoritative: Vec<Record>,
    pub secondary: Vec<Record>,
}

// ---------------------------------------------------------------------------
// Divergences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ReasonCode {
    DuplicateInSecondary = 1,
    MissingFromSecondary = 2,
    AttributeMismatch = 3,
    MissingFromAuthoritative = 4,
}

impl ReasonCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::DuplicateInSecondary),
            2 => Some(Self::MissingFromSecondary),
            3 => Some(Self::AttributeMismatch),
            4 => Some(Self::MissingFromAuthoritative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateInSecondary => "duplicate_in_secondary",
            Self::MissingFromSecondary => "missing_from_secondary",
            Self::AttributeMismatch => "attribute_mismatch",
            Self::MissingFromAuthoritative => "missing_from_authoritative",
        }
    }
}

impl From<ReasonCode> for u8 {
    fn from(reason: ReasonCode) -> u8 {
        reason.code()
    }
}

impl TryFrom<u8> for ReasonCode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown reason id {code}"))
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected discrepancy for a single case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Divergence {
    #[serde(rename = "CaseID")]
    pub case_id: String,
    pub event_code: String,
    pub event_name: String,
    #[serde(rename = "MMWRYear")]
    pub mmwr_year: String,
    #[serde(rename = "MMWRWeek")]
    pub mmwr_week: String,
    pub reason: String,
    #[serde(rename = "ReasonID")]
    pub reason_id: ReasonCode,
    pub case_class_status: String,
}

impl Divergence {
    /// Copy the descriptive fields of `record`; absent fields become "".
    pub fn from_record(record: &Record, reason_id: ReasonCode, reason: impl Into<String>) -> Self {
        let field = |name: &str| record.get(name).unwrap_or("").to_string();
        Self {
            case_id: field(CASE_ID),
            event_code: field(EVENT_CODE),
            event_name: field(EVENT_NAME),
            mmwr_year: field(MMWR_YEAR),
            mmwr_week: field(MMWR_WEEK),
            reason: reason.into(),
            reason_id,
            case_class_status: field(CASE_CLASS_STATUS),
        }
    }
}

pub const REASON_DUPLICATE: &str = "Duplicate CaseID found in secondary dataset";
pub const REASON_MISSING_FROM_SECONDARY: &str = "CaseID not found in secondary dataset";
pub const REASON_MISSING_FROM_AUTHORITATIVE: &str = "CaseID not found in authoritative dataset";

pub fn attribute_mismatch_reason(attributes: &[String]) -> String {
    format!(
        "Case differs on {} between authoritative and secondary datasets",
        attributes.join(", ")
    )
}

// ---------------------------------------------------------------------------
// Run-wide accumulators
// ---------------------------------------------------------------------------

/// Divergences and statistics accumulated across one run.
///
/// Created fresh per run and threaded through every phase. The divergence
/// list is only ever appended to.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub divergences: Vec<Divergence>,
    pub stats: StatsByEventCode,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, divergence: Divergence) {
        self.divergences.push(divergence);
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub authoritative_rows: usize,
    pub secondary_rows: usize,
    pub authoritative_cases: usize,
    pub secondary_cases: usize,
    pub matched: usize,
    pub duplicates: usize,
    pub missing_from_secondary: usize,
    pub attribute_mismatches: usize,
    pub missing_from_authoritative: usize,
    pub total_divergences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub options: CompareOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub divergences: Vec<Divergence>,
    pub stats: StatsByEventCode,
}
