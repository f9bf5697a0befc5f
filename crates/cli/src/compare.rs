//! `caserecon compare`: run one reconciliation and write its report.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;

use caserecon_config::Settings;
use caserecon_io::archive::archive_report;
use caserecon_io::csv::read_file_as_utf8;
use caserecon_io::report::write_report_dir;
use caserecon_io::store::ReportStore;
use caserecon_recon::{
    load_csv_records, AttributeSelection, CompareOptions, EventCodeFilter, ReconInput, ReconResult,
    Record, Side,
};

use crate::exit_codes::EXIT_DIVERGENCES;
use crate::{open_store, CliError};

/// Store-backed setting naming the archive root.
pub(crate) const ARCHIVE_PATH_KEY: &str = "archive_path";

#[derive(Args)]
pub struct CompareArgs {
    /// Authoritative dataset (state export, CSV)
    #[arg(long, short = 'a')]
    pub authoritative: PathBuf,

    /// Secondary dataset (CDC extract, CSV)
    #[arg(long, short = 's')]
    pub secondary: PathBuf,

    /// Directory to write results.csv and stats.csv into
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Index every authoritative event code, not only those seen in the secondary dataset
    #[arg(long)]
    pub no_filter: bool,

    /// Compare only these attributes (default: every authoritative field)
    #[arg(long, num_args = 1..)]
    pub attributes: Vec<String>,

    /// TOML file with compare options; flags above override it
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Report name when persisting (default: "Report <id>")
    #[arg(long)]
    pub name: Option<String>,

    /// Save the report to the local report store
    #[arg(long)]
    pub persist: bool,

    /// Copy the report files into <archive_path>/<report id>/
    #[arg(long, requires = "persist")]
    pub archive: bool,

    /// Print the full result as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Exit with code 3 when any divergence is found
    #[arg(long)]
    pub fail_on_divergence: bool,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    output_dir: &'a Path,
    report_id: Option<i64>,
    archive_dir: Option<&'a Path>,
    #[serde(flatten)]
    result: &'a ReconResult,
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let options = resolve_options(&args, &settings)?;

    let input = ReconInput {
        authoritative: load_side(&args.authoritative, Side::Authoritative)?,
        secondary: load_side(&args.secondary, Side::Secondary)?,
    };

    let result = caserecon_recon::run(&options, input).map_err(CliError::recon)?;

    // Store and archive settings are checked before anything is written
    let mut store = if args.persist { Some(open_store(&settings)?) } else { None };
    let archive_root = match &store {
        Some(store) if args.archive => Some(resolve_archive_root(store, &settings)?),
        _ => None,
    };

    let (results_path, stats_path) = write_report_dir(&args.output, &result.divergences, &result.stats)
        .map_err(|e| CliError::io(e).with_hint("choose an output directory without a previous report"))?;

    let mut report_id = None;
    let mut archive_dir = None;
    if let Some(store) = store.as_mut() {
        let id = store
            .insert_report(args.name.as_deref().unwrap_or(""), &result.divergences, &result.stats)
            .map_err(CliError::store)?;
        report_id = Some(id);

        if let Some(root) = &archive_root {
            let dir = archive_report(root, id, &args.output).map_err(CliError::io)?;
            archive_dir = Some(dir);
        }
    }

    if args.json {
        let out = CompareOutput {
            output_dir: &args.output,
            report_id,
            archive_dir: archive_dir.as_deref(),
            result: &result,
        };
        let json = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "compared {} authoritative / {} secondary cases: {} divergences ({} matched)",
        s.authoritative_cases, s.secondary_cases, s.total_divergences, s.matched,
    );
    eprintln!(
        "  duplicates {}, missing from secondary {}, attribute mismatches {}, missing from authoritative {}",
        s.duplicates, s.missing_from_secondary, s.attribute_mismatches, s.missing_from_authoritative,
    );
    eprintln!("wrote {} and {}", results_path.display(), stats_path.display());
    if let Some(id) = report_id {
        eprintln!("stored report {id}");
    }
    if let Some(dir) = &archive_dir {
        eprintln!("archived to {}", dir.display());
    }

    if args.fail_on_divergence && s.total_divergences > 0 {
        return Err(CliError {
            code: EXIT_DIVERGENCES,
            message: format!("{} divergences found", s.total_divergences),
            hint: None,
        });
    }

    Ok(())
}

/// Options file (or settings) first, then command-line overrides.
fn resolve_options(args: &CompareArgs, settings: &Settings) -> Result<CompareOptions, CliError> {
    let mut options = match &args.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read options {}: {e}", path.display())))?;
            CompareOptions::from_toml(&text).map_err(CliError::recon)?
        }
        None => CompareOptions::new(
            settings
                .attributes
                .clone()
                .map(AttributeSelection::Listed)
                .unwrap_or_default(),
            if settings.filter_by_event_code {
                EventCodeFilter::HarvestFromSecondary
            } else {
                EventCodeFilter::Disabled
            },
        ),
    };

    if args.no_filter {
        options.event_code_filter = EventCodeFilter::Disabled;
    }
    if !args.attributes.is_empty() {
        options.attributes = AttributeSelection::Listed(args.attributes.clone());
    }

    options.validate().map_err(CliError::recon)?;
    log::debug!("compare options: {:?}", options);
    Ok(options)
}

fn load_side(path: &Path, side: Side) -> Result<Vec<Record>, CliError> {
    let text = read_file_as_utf8(path).map_err(CliError::io)?;
    let records = load_csv_records(side, &text).map_err(|e| {
        let mut err = CliError::recon(e);
        err.message = format!("{}: {}", path.display(), err.message);
        err
    })?;
    log::info!("loaded {} {} rows from {}", records.len(), side, path.display());
    Ok(records)
}

/// Archive root from the store's config table, else settings.json.
fn resolve_archive_root(store: &ReportStore, settings: &Settings) -> Result<PathBuf, CliError> {
    let from_store = store.get_setting(ARCHIVE_PATH_KEY).map_err(CliError::store)?;
    from_store
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| settings.archive_path.clone())
        .ok_or_else(|| {
            CliError::args("--archive needs an archive path")
                .with_hint(format!("caserecon settings set {ARCHIVE_PATH_KEY} <dir>"))
        })
}
