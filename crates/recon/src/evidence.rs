use crate::model::{Divergence, ReasonCode, ReconSummary};

/// Row and case counts gathered while a run builds its indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub authoritative_rows: usize,
    pub secondary_rows: usize,
    pub authoritative_cases: usize,
    pub secondary_cases: usize,
    pub matched: usize,
}

/// Compute summary statistics from the divergences of one run.
pub fn compute_summary(divergences: &[Divergence], counts: RunCounts) -> ReconSummary {
    let mut summary = ReconSummary {
        authoritative_rows: counts.authoritative_rows,
        secondary_rows: counts.secondary_rows,
        authoritative_cases: counts.authoritative_cases,
        secondary_cases: counts.secondary_cases,
        matched: counts.matched,
        total_divergences: divergences.len(),
        ..ReconSummary::default()
    };

    for d in divergences {
        match d.reason_id {
            ReasonCode::DuplicateInSecondary => summary.duplicates += 1,
            ReasonCode::MissingFromSecondary => summary.missing_from_secondary += 1,
            ReasonCode::AttributeMismatch => summary.attribute_mismatches += 1,
            ReasonCode::MissingFromAuthoritative => summary.missing_from_authoritative += 1,
        }
    }

    summary
}
