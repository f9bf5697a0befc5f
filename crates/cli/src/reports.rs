//! `caserecon reports`: browse and manage the local report store.

use clap::Subcommand;

use caserecon_config::Settings;
use caserecon_recon::Divergence;
use caserecon_io::report::StatsRow;

use crate::util::render_table;
use crate::{open_store, CliError};

const MAX_CELL: usize = 40;

#[derive(Subcommand)]
pub enum ReportsCommands {
    /// List stored reports, newest first
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show the divergences of one report
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },

    /// Show the per-event-code statistics of one report
    Stats {
        id: i64,
        #[arg(long)]
        json: bool,
    },

    /// Rename a report (an empty name restores "Report <id>")
    Rename { id: i64, name: String },

    /// Delete a report with its cases and statistics
    Delete { id: i64 },
}

pub fn cmd_reports(cmd: ReportsCommands) -> Result<(), CliError> {
    let settings = Settings::load();
    let mut store = open_store(&settings)?;

    match cmd {
        ReportsCommands::List { json } => {
            let reports = store.list_reports().map_err(CliError::store)?;
            if json {
                return print_json(&reports);
            }
            if reports.is_empty() {
                eprintln!("no stored reports");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = reports
                .iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.created_at_date.clone(),
                        r.time_of_creation.clone(),
                        r.number_of_discrepancies.to_string(),
                        r.name.clone(),
                    ]
                })
                .collect();
            print!("{}", render_table(&["ID", "Date", "Time", "Divergences", "Name"], &rows, MAX_CELL));
        }
        ReportsCommands::Show { id, json } => {
            let cases = store.report_cases(id).map_err(CliError::store)?;
            if json {
                return print_json(&cases);
            }
            print!("{}", cases_table(&cases));
        }
        ReportsCommands::Stats { id, json } => {
            let stats = store.report_statistics(id).map_err(CliError::store)?;
            if json {
                return print_json(&stats);
            }
            print!("{}", stats_table(&stats));
        }
        ReportsCommands::Rename { id, name } => {
            store.rename_report(id, &name).map_err(CliError::store)?;
            let report = store.report(id).map_err(CliError::store)?;
            eprintln!("report {} renamed to \"{}\"", id, report.name);
        }
        ReportsCommands::Delete { id } => {
            store.delete_report(id).map_err(CliError::store)?;
            eprintln!("deleted report {id}");
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}

fn cases_table(cases: &[Divergence]) -> String {
    let rows: Vec<Vec<String>> = cases
        .iter()
        .map(|d| {
            vec![
                d.case_id.clone(),
                d.event_code.clone(),
                d.event_name.clone(),
                d.mmwr_year.clone(),
                d.mmwr_week.clone(),
                d.reason_id.code().to_string(),
                d.reason.clone(),
            ]
        })
        .collect();
    render_table(
        &["CaseID", "EventCode", "EventName", "Year", "Week", "ReasonID", "Reason"],
        &rows,
        MAX_CELL,
    )
}

fn stats_table(stats: &[StatsRow]) -> String {
    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|s| {
            vec![
                s.event_code.clone(),
                s.event_name.clone(),
                s.total_cases.to_string(),
                s.total_duplicates.to_string(),
                s.total_missing_from_secondary.to_string(),
                s.total_missing_from_authoritative.to_string(),
                s.total_wrong_attributes.to_string(),
            ]
        })
        .collect();
    render_table(
        &["EventCode", "EventName", "Cases", "Dup", "NotInSecondary", "NotInAuthoritative", "WrongAttr"],
        &rows,
        MAX_CELL,
    )
}
