//! `caserecon bench-data`: synthetic datasets for timing runs.
//!
//! Every generated row gets a fresh UUID CaseID. The same CaseIDs appear in
//! both output files, in the same order; every other column is copied from a
//! randomly chosen source row of the matching input.

use std::path::{Path, PathBuf};

use clap::Args;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use caserecon_io::csv::read_file_as_utf8;
use caserecon_recon::model::CASE_ID;
use caserecon_recon::{load_csv_records, Record, Side};

use crate::CliError;

pub const AUTHORITATIVE_BENCH_FILE: &str = "authoritative_bench.csv";
pub const SECONDARY_BENCH_FILE: &str = "secondary_bench.csv";

#[derive(Args)]
pub struct BenchArgs {
    /// Authoritative source rows to sample from
    #[arg(long, short = 'a')]
    pub authoritative: PathBuf,

    /// Secondary source rows to sample from
    #[arg(long, short = 's')]
    pub secondary: PathBuf,

    /// Rows per generated file
    #[arg(long, default_value = "1000000")]
    pub rows: usize,

    /// Output directory
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Seed for reproducible output (CaseIDs included)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn cmd_bench_data(args: BenchArgs) -> Result<(), CliError> {
    let authoritative = load_source(&args.authoritative, Side::Authoritative)?;
    let secondary = load_source(&args.secondary, Side::Secondary)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let case_ids: Vec<String> = (0..args.rows)
        .map(|_| {
            uuid::Builder::from_random_bytes(rng.gen())
                .into_uuid()
                .to_string()
        })
        .collect();

    std::fs::create_dir_all(&args.output)
        .map_err(|e| CliError::io(format!("{}: {}", args.output.display(), e)))?;

    let auth_path = args.output.join(AUTHORITATIVE_BENCH_FILE);
    write_bench_file(&auth_path, &authoritative, &case_ids, &mut rng)?;
    let sec_path = args.output.join(SECONDARY_BENCH_FILE);
    write_bench_file(&sec_path, &secondary, &case_ids, &mut rng)?;

    eprintln!(
        "wrote {} rows to {} and {}",
        case_ids.len(),
        auth_path.display(),
        sec_path.display()
    );
    Ok(())
}

fn load_source(path: &Path, side: Side) -> Result<Vec<Record>, CliError> {
    let text = read_file_as_utf8(path).map_err(CliError::io)?;
    let records = load_csv_records(side, &text).map_err(CliError::recon)?;
    if records.is_empty() {
        return Err(CliError::parse(format!("{}: no data rows to sample", path.display())));
    }
    Ok(records)
}

fn write_bench_file(
    path: &Path,
    source: &[Record],
    case_ids: &[String],
    rng: &mut StdRng,
) -> Result<(), CliError> {
    let file = std::fs::File::create(path)
        .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    let mut writer = csv::Writer::from_writer(std::io::BufWriter::new(file));
    let io_err = |e: csv::Error| CliError::io(format!("{}: {}", path.display(), e));

    // load_source guarantees at least one row
    let Some(first) = source.first() else {
        return Ok(());
    };
    let columns: Vec<&str> = first.field_names().collect();
    writer.write_record(&columns).map_err(io_err)?;

    for case_id in case_ids {
        let Some(row) = source.choose(rng) else {
            break;
        };
        let values = columns.iter().map(|&column| {
            if column == CASE_ID {
                case_id.as_str()
            } else {
                row.get(column).unwrap_or("")
            }
        });
        writer.write_record(values).map_err(io_err)?;
    }

    writer
        .flush()
        .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))
}
