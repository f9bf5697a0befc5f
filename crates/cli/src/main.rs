// caserecon CLI - compare a state export against a CDC extract, manage stored reports

mod bench;
mod compare;
mod exit_codes;
mod reports;
mod settings;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use caserecon_io::store::{ReportStore, StoreError};
use caserecon_recon::ReconError;

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_STORE, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "caserecon")]
#[command(about = "Reconcile case records between an authoritative and a secondary dataset")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two CSV datasets and write results.csv + stats.csv
    #[command(after_help = "\
Examples:
  caserecon compare --authoritative state.csv --secondary cdc.csv --output out/
  caserecon compare -a state.csv -s cdc.csv -o out/ --attributes MMWRYear MMWRWeek
  caserecon compare -a state.csv -s cdc.csv -o out/ --persist --archive --name 'Week 13'
  caserecon compare -a state.csv -s cdc.csv -o out/ --json --fail-on-divergence

Options file (--options):
  event_code_filter = \"harvest_from_secondary\"   # or \"disabled\"

  [attributes]
  mode = \"listed\"                                # or \"all_authoritative_fields\"
  names = [\"EventCode\", \"MMWRYear\", \"MMWRWeek\"]")]
    Compare(compare::CompareArgs),

    /// List, inspect, rename and delete stored reports
    #[command(subcommand)]
    Reports(reports::ReportsCommands),

    /// Read or write store-backed settings (archive_path)
    #[command(subcommand)]
    Settings(settings::SettingsCommands),

    /// Generate benchmark datasets with fresh shared CaseIDs
    #[command(after_help = "\
Examples:
  caserecon bench-data -a state.csv -s cdc.csv --rows 100000 --output bench/
  caserecon bench-data -a state.csv -s cdc.csv --rows 1000 --output bench/ --seed 7")]
    BenchData(bench::BenchArgs),
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  caserecon-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  caserecon-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compare(args) => compare::cmd_compare(args),
        Commands::Reports(cmd) => reports::cmd_reports(cmd),
        Commands::Settings(cmd) => settings::cmd_settings(cmd),
        Commands::BenchData(args) => bench::cmd_bench_data(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    /// Map an engine error onto the exit code registry.
    pub fn recon(err: ReconError) -> Self {
        match err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => Self::args(err.to_string()),
            ReconError::TimestampParse { .. } => Self::parse(err.to_string())
                .with_hint("add_time must look like 2023-04-01 10:00:00 or 2023-04-01 10:00:00.250"),
            ReconError::MissingColumn { .. } => Self::parse(err.to_string())
                .with_hint("both datasets need a header row with CaseID and EventCode"),
            ReconError::Csv { .. } => Self::parse(err.to_string()),
        }
    }

    pub fn store(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::NotFound(_) => Some("run `caserecon reports list` to see stored ids".to_string()),
            StoreError::Sqlite(_) | StoreError::Io(_) => Some(format!(
                "set {} or store.path in settings.json to use another database",
                caserecon_config::STORE_ENV
            )),
            StoreError::Corrupt(_) => None,
        };
        Self { code: EXIT_STORE, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Open the report store named by settings (or `CASERECON_STORE`).
pub(crate) fn open_store(settings: &caserecon_config::Settings) -> Result<ReportStore, CliError> {
    let path: PathBuf = settings.effective_store_path();
    log::debug!("opening report store {}", path.display());
    ReportStore::open(&path).map_err(CliError::store)
}
