// Report files: results.csv (divergences) and stats.csv (per event code)

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use caserecon_recon::{Divergence, EventCodeStats, StatsByEventCode};

pub const RESULTS_FILE: &str = "results.csv";
pub const STATS_FILE: &str = "stats.csv";

pub const RESULTS_HEADERS: [&str; 8] = [
    "CaseID",
    "EventCode",
    "EventName",
    "MMWRYear",
    "MMWRWeek",
    "Reason",
    "ReasonID",
    "CaseClassStatus",
];

pub const STATS_HEADERS: [&str; 7] = [
    "EventCode",
    "EventName",
    "TotalCases",
    "TotalDuplicates",
    "TotalMissingFromSecondary",
    "TotalMissingFromAuthoritative",
    "TotalWrongAttributes",
];

/// One line of stats.csv.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatsRow {
    pub event_code: String,
    pub event_name: String,
    pub total_cases: u64,
    pub total_duplicates: u64,
    pub total_missing_from_secondary: u64,
    pub total_missing_from_authoritative: u64,
    pub total_wrong_attributes: u64,
}

impl StatsRow {
    pub fn new(event_code: &str, stats: &EventCodeStats) -> Self {
        Self {
            event_code: event_code.to_string(),
            event_name: stats.event_name.clone(),
            total_cases: stats.total_cases,
            total_duplicates: stats.total_duplicates,
            total_missing_from_secondary: stats.total_missing_from_secondary,
            total_missing_from_authoritative: stats.total_missing_from_authoritative,
            total_wrong_attributes: stats.total_wrong_attributes,
        }
    }

    pub fn to_stats(&self) -> EventCodeStats {
        EventCodeStats {
            event_name: self.event_name.clone(),
            total_cases: self.total_cases,
            total_duplicates: self.total_duplicates,
            total_missing_from_secondary: self.total_missing_from_secondary,
            total_missing_from_authoritative: self.total_missing_from_authoritative,
            total_wrong_attributes: self.total_wrong_attributes,
        }
    }
}

pub fn stats_rows(stats: &StatsByEventCode) -> Vec<StatsRow> {
    stats.iter().map(|(code, s)| StatsRow::new(code, s)).collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub fn write_results<W: Write>(out: W, divergences: &[Divergence]) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(out);
    if divergences.is_empty() {
        // serialize() only emits headers alongside the first record
        writer.write_record(RESULTS_HEADERS).map_err(|e| e.to_string())?;
    }
    for d in divergences {
        writer.serialize(d).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

pub fn write_stats<W: Write>(out: W, stats: &StatsByEventCode) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(out);
    if stats.is_empty() {
        writer.write_record(STATS_HEADERS).map_err(|e| e.to_string())?;
    }
    for row in stats_rows(stats) {
        writer.serialize(&row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}

/// Create `dir` and write both report files into it.
///
/// Refuses to overwrite an existing report in `dir`.
pub fn write_report_dir(
    dir: &Path,
    divergences: &[Divergence],
    stats: &StatsByEventCode,
) -> Result<(PathBuf, PathBuf), String> {
    let results_path = dir.join(RESULTS_FILE);
    let stats_path = dir.join(STATS_FILE);
    if results_path.exists() || stats_path.exists() {
        return Err(format!("{} already contains a report", dir.display()));
    }

    std::fs::create_dir_all(dir).map_err(|e| format!("{}: {}", dir.display(), e))?;

    let file = std::fs::File::create(&results_path)
        .map_err(|e| format!("{}: {}", results_path.display(), e))?;
    write_results(std::io::BufWriter::new(file), divergences)?;

    let file = std::fs::File::create(&stats_path)
        .map_err(|e| format!("{}: {}", stats_path.display(), e))?;
    write_stats(std::io::BufWriter::new(file), stats)?;

    log::info!(
        "wrote {} divergences and {} event codes to {}",
        divergences.len(),
        stats.len(),
        dir.display()
    );
    Ok((results_path, stats_path))
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

pub fn read_results<R: Read>(input: R) -> Result<Vec<Divergence>, String> {
    let mut reader = csv::Reader::from_reader(input);
    reader
        .deserialize()
        .map(|row| row.map_err(|e| e.to_string()))
        .collect()
}

pub fn read_stats<R: Read>(input: R) -> Result<StatsByEventCode, String> {
    let mut reader = csv::Reader::from_reader(input);
    let mut stats = StatsByEventCode::new();
    for row in reader.deserialize::<StatsRow>() {
        let row = row.map_err(|e| e.to_string())?;
        stats.insert(row.event_code.clone(), row.to_stats());
    }
    Ok(stats)
}
