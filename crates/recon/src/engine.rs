use std::sync::Arc;

use crate::config::CompareOptions;
use crate::error::ReconError;
use crate::evidence::{compute_summary, RunCounts};
use crate::index::{build_authoritative_index, build_secondary_index};
use crate::matcher::reconcile;
use crate::model::{Findings, ReconInput, ReconMeta, ReconResult, Record, Side, CASE_ID, EVENT_CODE};

/// Run one comparison. Returns divergences, per-event-code stats and a summary.
///
/// Secondary index first (harvesting event codes if the filter is enabled),
/// then the authoritative index restricted by those codes, then the join.
/// All accumulators are local to this call.
pub fn run(options: &CompareOptions, input: ReconInput) -> Result<ReconResult, ReconError> {
    options.validate()?;

    let ReconInput {
        authoritative,
        secondary,
    } = input;
    let authoritative_rows = authoritative.len();
    let secondary_rows = secondary.len();

    let mut findings = Findings::new();

    let secondary_out =
        build_secondary_index(secondary, options.event_code_filter.is_enabled(), &mut findings);
    let authoritative_index =
        build_authoritative_index(authoritative, secondary_out.event_codes.as_ref())?;

    let outcome = reconcile(
        &authoritative_index,
        &secondary_out.index,
        &options.attributes,
        &mut findings,
    );

    let summary = compute_summary(
        &findings.divergences,
        RunCounts {
            authoritative_rows,
            secondary_rows,
            authoritative_cases: authoritative_index.len(),
            secondary_cases: secondary_out.index.len(),
            matched: outcome.matched,
        },
    );

    log::info!(
        "reconciled {} authoritative / {} secondary cases: {} divergences",
        summary.authoritative_cases,
        summary.secondary_cases,
        summary.total_divergences,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            options: options.clone(),
        },
        summary,
        divergences: findings.divergences,
        stats: findings.stats,
    })
}

/// Load CSV text into records, keeping every column verbatim.
///
/// The header row is required and must name `CaseID` and `EventCode`. A UTF-8
/// byte-order mark before the first header is ignored.
pub fn load_csv_records(side: Side, csv_data: &str) -> Result<Vec<Record>, ReconError> {
    let csv_data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(side, &e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    for required in [CASE_ID, EVENT_CODE] {
        if !headers.iter().any(|h| h == required) {
            return Err(ReconError::MissingColumn {
                side,
                column: required.into(),
            });
        }
    }

    // A repeated header name keeps one column, holding the last value
    let mut unique: Vec<String> = Vec::with_capacity(headers.len());
    let slots: Vec<usize> = headers
        .iter()
        .map(|h| match unique.iter().position(|u| u == h) {
            Some(slot) => slot,
            None => {
                unique.push(h.clone());
                unique.len() - 1
            }
        })
        .collect();
    if unique.len() < headers.len() {
        log::warn!("{side} dataset: repeated header names, keeping the last column of each");
    }

    let columns: Arc<[String]> = unique.into();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| csv_error(side, &e))?;
        let mut values: Vec<String> = Vec::with_capacity(columns.len());
        for (field, &slot) in row.iter().zip(&slots) {
            if slot == values.len() {
                values.push(field.to_string());
            } else {
                values[slot] = field.to_string();
            }
        }
        records.push(Record::new(Arc::clone(&columns), values));
    }

    log::debug!("loaded {} {side} records", records.len());
    Ok(records)
}

fn csv_error(side: Side, err: &csv::Error) -> ReconError {
    ReconError::Csv {
        side,
        line: err.position().map(|p| p.line()),
        message: err.to_string(),
    }
}
