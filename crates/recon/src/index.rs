use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::error::ReconError;
use crate::model::{Divergence, Findings, ReasonCode, Record, ADD_TIME, REASON_DUPLICATE};

/// Event codes harvested verbatim from the secondary dataset.
pub type EventCodeSet = HashSet<String>;

const ADD_TIME_FRACTIONAL: &str = "%Y-%m-%d %H:%M:%S%.f";
const ADD_TIME_WHOLE: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Case index
// ---------------------------------------------------------------------------

/// CaseID → record, remembering the order in which each CaseID first appeared.
///
/// Replacing the record of an existing CaseID keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct CaseIndex {
    records: HashMap<String, Record>,
    order: Vec<String>,
}

impl CaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, case_id: &str) -> Option<&Record> {
        self.records.get(case_id)
    }

    pub fn contains(&self, case_id: &str) -> bool {
        self.records.contains_key(case_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in first-seen CaseID order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).map(|r| (id.as_str(), r)))
    }

    fn insert_new(&mut self, case_id: String, record: Record) {
        self.order.push(case_id.clone());
        self.records.insert(case_id, record);
    }

    fn replace(&mut self, case_id: &str, record: Record) {
        if let Some(slot) = self.records.get_mut(case_id) {
            *slot = record;
        }
    }
}

pub type AuthoritativeIndex = CaseIndex;
pub type SecondaryIndex = CaseIndex;

// ---------------------------------------------------------------------------
// Authoritative side
// ---------------------------------------------------------------------------

/// True for a non-empty run of ASCII decimal digits (no sign, no point).
pub fn is_numeric_event_code(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an `add_time` value, fractional seconds first.
pub fn parse_add_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, ADD_TIME_FRACTIONAL)
        .or_else(|_| NaiveDateTime::parse_from_str(value, ADD_TIME_WHOLE))
        .ok()
}

fn add_time_of(record: &Record) -> Result<NaiveDateTime, ReconError> {
    let value = record.get(ADD_TIME).unwrap_or("");
    parse_add_time(value).ok_or_else(|| ReconError::TimestampParse {
        case_id: record.case_id().to_string(),
        value: value.to_string(),
    })
}

/// Index the authoritative stream by CaseID.
///
/// Records with a non-numeric event code are dropped, as are records whose
/// code is not in `filter` when one is given. On a CaseID collision the record
/// with the strictly later `add_time` wins; ties keep the first-seen record.
/// Timestamps are only parsed on collision, and a parse failure aborts the run.
pub fn build_authoritative_index<I>(
    records: I,
    filter: Option<&EventCodeSet>,
) -> Result<AuthoritativeIndex, ReconError>
where
    I: IntoIterator<Item = Record>,
{
    let mut index = CaseIndex::new();
    let mut skipped_malformed = 0usize;
    let mut skipped_filtered = 0usize;
    let mut replaced = 0usize;

    for record in records {
        let code = record.event_code();
        if !is_numeric_event_code(code) {
            skipped_malformed += 1;
            continue;
        }
        if let Some(codes) = filter {
            if !codes.contains(code) {
                skipped_filtered += 1;
                continue;
            }
        }

        match index.get(record.case_id()) {
            Some(existing) => {
                let existing_time = add_time_of(existing)?;
                let incoming_time = add_time_of(&record)?;
                if incoming_time > existing_time {
                    log::trace!("case {}: newer add_time replaces indexed record", record.case_id());
                    let case_id = record.case_id().to_string();
                    index.replace(&case_id, record);
                    replaced += 1;
                }
            }
            None => {
                let case_id = record.case_id().to_string();
                index.insert_new(case_id, record);
            }
        }
    }

    log::debug!(
        "authoritative index: {} cases ({} replaced by recency, {} non-numeric event codes, {} filtered)",
        index.len(),
        replaced,
        skipped_malformed,
        skipped_filtered,
    );

    Ok(index)
}

// ---------------------------------------------------------------------------
// Secondary side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SecondaryIndexOutput {
    pub index: SecondaryIndex,
    /// `Some` only when harvesting was requested.
    pub event_codes: Option<EventCodeSet>,
}

/// Index the secondary stream by CaseID, first occurrence wins.
///
/// Every later occurrence of an indexed CaseID becomes a reason-1 divergence
/// built from that later record and bumps `total_duplicates` for its event
/// code. Statistics entries are created for codes of first occurrences.
pub fn build_secondary_index<I>(
    records: I,
    harvest_event_codes: bool,
    findings: &mut Findings,
) -> SecondaryIndexOutput
where
    I: IntoIterator<Item = Record>,
{
    let mut index = CaseIndex::new();
    let mut event_codes = harvest_event_codes.then(EventCodeSet::new);
    let mut duplicates = 0usize;

    for record in records {
        if let Some(codes) = event_codes.as_mut() {
            if !codes.contains(record.event_code()) {
                codes.insert(record.event_code().to_string());
            }
        }

        if index.contains(record.case_id()) {
            findings.push(Divergence::from_record(
                &record,
                ReasonCode::DuplicateInSecondary,
                REASON_DUPLICATE,
            ));
            findings
                .stats
                .entry(record.event_code(), record.event_name())
                .total_duplicates += 1;
            duplicates += 1;
        } else {
            findings.stats.entry(record.event_code(), record.event_name());
            let case_id = record.case_id().to_string();
            index.insert_new(case_id, record);
        }
    }

    log::debug!(
        "secondary index: {} cases, {} duplicate rows{}",
        index.len(),
        duplicates,
        match &event_codes {
            Some(codes) => format!(", {} event codes harvested", codes.len()),
            None => String::new(),
        },
    );

    SecondaryIndexOutput { index, event_codes }
}
