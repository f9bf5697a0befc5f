use std::collections::HashSet;

use crate::config::AttributeSelection;
use crate::index::{AuthoritativeIndex, SecondaryIndex};
use crate::model::{
    attribute_mismatch_reason, Divergence, Findings, ReasonCode, Record,
    REASON_MISSING_FROM_AUTHORITATIVE, REASON_MISSING_FROM_SECONDARY,
};

/// Stand-in for an empty value during attribute comparison.
pub const NULL_SENTINEL: &str = "NULL";

/// Per-category case counts from one join pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinOutcome {
    pub matched: usize,
    pub mismatched: usize,
    pub missing_from_secondary: usize,
    pub missing_from_authoritative: usize,
}

/// Join the two indices, appending divergences and updating statistics.
///
/// Every authoritative case lands in exactly one of matched, mismatched or
/// missing-from-secondary; every secondary case no authoritative case claimed
/// is reported as missing-from-authoritative. Matched/mismatched cases are
/// bucketed under the authoritative record's event code. Neither index is
/// modified.
pub fn reconcile(
    authoritative: &AuthoritativeIndex,
    secondary: &SecondaryIndex,
    attributes: &AttributeSelection,
    findings: &mut Findings,
) -> JoinOutcome {
    let mut outcome = JoinOutcome::default();
    let mut claimed: HashSet<&str> = HashSet::with_capacity(authoritative.len().min(secondary.len()));

    for (case_id, auth_row) in authoritative.iter() {
        findings
            .stats
            .entry(auth_row.event_code(), auth_row.event_name())
            .total_cases += 1;

        let Some(sec_row) = secondary.get(case_id) else {
            findings.push(Divergence::from_record(
                auth_row,
                ReasonCode::MissingFromSecondary,
                REASON_MISSING_FROM_SECONDARY,
            ));
            findings
                .stats
                .entry(auth_row.event_code(), auth_row.event_name())
                .total_missing_from_secondary += 1;
            outcome.missing_from_secondary += 1;
            continue;
        };

        let differing = differing_attributes(auth_row, sec_row, attributes);
        if differing.is_empty() {
            outcome.matched += 1;
        } else {
            findings.push(Divergence::from_record(
                auth_row,
                ReasonCode::AttributeMismatch,
                attribute_mismatch_reason(&differing),
            ));
            findings
                .stats
                .entry(auth_row.event_code(), auth_row.event_name())
                .total_wrong_attributes += 1;
            outcome.mismatched += 1;
        }
        claimed.insert(case_id);
    }

    for (case_id, sec_row) in secondary.iter() {
        if claimed.contains(case_id) {
            continue;
        }
        findings.push(Divergence::from_record(
            sec_row,
            ReasonCode::MissingFromAuthoritative,
            REASON_MISSING_FROM_AUTHORITATIVE,
        ));
        let stats = findings.stats.entry(sec_row.event_code(), sec_row.event_name());
        stats.total_missing_from_authoritative += 1;
        stats.total_cases += 1;
        outcome.missing_from_authoritative += 1;
    }

    outcome
}

/// Names of compared attributes whose values differ, in comparison order.
///
/// Attributes absent on the secondary record are skipped. Empty values (and
/// values absent on the authoritative record) compare as [`NULL_SENTINEL`].
pub fn differing_attributes(
    authoritative: &Record,
    secondary: &Record,
    attributes: &AttributeSelection,
) -> Vec<String> {
    let names: Vec<&str> = match attributes {
        AttributeSelection::AllAuthoritativeFields => authoritative.field_names().collect(),
        AttributeSelection::Listed(names) => names.iter().map(String::as_str).collect(),
    };

    names
        .into_iter()
        .filter(|name| {
            let Some(sec_val) = secondary.get(name) else {
                return false;
            };
            let auth_val = authoritative.get(name).unwrap_or("");
            normalize(auth_val) != normalize(sec_val)
        })
        .map(str::to_string)
        .collect()
}

fn normalize(value: &str) -> &str {
    if value.is_empty() {
        NULL_SENTINEL
    } else {
        value
    }
}
