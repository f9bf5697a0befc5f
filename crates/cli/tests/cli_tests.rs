// End-to-end tests for the caserecon binary.
//
// Each test gets its own temp dir for the report store (CASERECON_STORE) and
// for settings.json (XDG_CONFIG_HOME), so the user's real config is never read.
//
// Run with: cargo test -p caserecon-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
}

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_caserecon"));
        cmd.env("CASERECON_STORE", self.path("store/reports.db"))
            .env("XDG_CONFIG_HOME", self.path("config"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cmd().args(args).output().unwrap()
    }

    fn compare(&self, output: &str, extra: &[&str]) -> Output {
        let state = fixture("state.csv");
        let cdc = fixture("cdc.csv");
        let out = self.path(output);
        let mut args = vec![
            "compare",
            "--authoritative",
            state.to_str().unwrap(),
            "--secondary",
            cdc.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be JSON ({e}):\n{stdout}"))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ===========================================================================
// compare
// ===========================================================================

#[test]
fn compare_writes_report_files() {
    let env = Env::new();
    let output = env.compare("out", &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let results = read(&env.path("out/results.csv"));
    let mut lines = results.lines();
    assert_eq!(
        lines.next().unwrap(),
        "CaseID,EventCode,EventName,MMWRYear,MMWRWeek,Reason,ReasonID,CaseClassStatus"
    );
    // event code filter is on by default: Lyme disease (1008) never reaches the join
    let ids: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(ids, vec!["1003", "1003", "1002", "1005", "1009", "1010"]);

    let stats = read(&env.path("out/stats.csv"));
    assert!(stats.starts_with(
        "EventCode,EventName,TotalCases,TotalDuplicates,TotalMissingFromSecondary,TotalMissingFromAuthoritative,TotalWrongAttributes"
    ));
    assert!(stats.contains("10190,Botulism,"));

    assert!(stderr(&output).contains("6 divergences"));
}

#[test]
fn compare_no_filter_reports_unharvested_codes() {
    let env = Env::new();
    let output = env.compare("out", &["--no-filter", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json = stdout_json(&output);
    assert_eq!(json["summary"]["total_divergences"], 7);
    assert_eq!(json["summary"]["missing_from_secondary"], 2);
    assert_eq!(json["meta"]["options"]["event_code_filter"], "disabled");
    assert!(json["report_id"].is_null());
    assert_eq!(json["stats"]["10560"]["total_missing_from_secondary"], 1);
}

#[test]
fn compare_listed_attributes() {
    let env = Env::new();
    let output = env.compare("out", &["--json", "--attributes", "MMWRYear", "CaseClassStatus"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json = stdout_json(&output);
    assert_eq!(json["summary"]["attribute_mismatches"], 0);
    assert_eq!(json["summary"]["matched"], 4);
}

#[test]
fn compare_options_file() {
    let env = Env::new();
    let options = env.path("options.toml");
    std::fs::write(
        &options,
        "event_code_filter = \"disabled\"\n\n[attributes]\nmode = \"listed\"\nnames = [\"MMWRWeek\"]\n",
    )
    .unwrap();

    let output = env.compare("out", &["--json", "--options", options.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json = stdout_json(&output);
    assert_eq!(json["meta"]["options"]["attributes"]["mode"], "listed");
    assert_eq!(json["summary"]["total_divergences"], 7);
}

#[test]
fn invalid_options_file_is_usage_error() {
    let env = Env::new();
    let options = env.path("options.toml");
    std::fs::write(&options, "[attributes]\nmode = \"listed\"\nnames = [\"A\", \"A\"]\n").unwrap();

    let output = env.compare("out", &["--options", options.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("more than once"));
}

#[test]
fn fail_on_divergence_exit_code() {
    let env = Env::new();
    let output = env.compare("out", &["--fail-on-divergence"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(env.path("out/results.csv").exists());
}

#[test]
fn refuses_to_overwrite_report() {
    let env = Env::new();
    assert!(env.compare("out", &[]).status.success());
    let output = env.compare("out", &[]);
    assert_eq!(output.status.code(), Some(6));
    assert!(stderr(&output).contains("already contains a report"));
}

#[test]
fn missing_column_is_parse_error() {
    let env = Env::new();
    let bad = env.path("bad.csv");
    std::fs::write(&bad, "Id,EventCode\n1,10\n").unwrap();
    let cdc = fixture("cdc.csv");
    let out = env.path("out");
    let output = env.run(&[
        "compare",
        "-a",
        bad.to_str().unwrap(),
        "-s",
        cdc.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("CaseID"));
}

#[test]
fn bad_add_time_is_parse_error() {
    let env = Env::new();
    let state = env.path("state.csv");
    std::fs::write(
        &state,
        "CaseID,EventCode,add_time\n1,10,2024-01-01 00:00:00\n1,10,01/02/2024\n",
    )
    .unwrap();
    let cdc = env.path("cdc.csv");
    std::fs::write(&cdc, "CaseID,EventCode\n1,10\n").unwrap();
    let out = env.path("out");
    let output = env.run(&[
        "compare",
        "-a",
        state.to_str().unwrap(),
        "-s",
        cdc.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("01/02/2024"));
}

#[test]
fn missing_input_is_io_error() {
    let env = Env::new();
    let out = env.path("out");
    let output = env.run(&[
        "compare",
        "-a",
        "/nonexistent/state.csv",
        "-s",
        "/nonexistent/cdc.csv",
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn archive_requires_persist() {
    let env = Env::new();
    let output = env.compare("out", &["--archive"]);
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// persistence, reports, settings
// ===========================================================================

#[test]
fn persist_and_browse_reports() {
    let env = Env::new();
    let output = env.compare("out", &["--persist", "--json", "--name", "Week 13"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let id = stdout_json(&output)["report_id"].as_i64().unwrap();

    let list = env.run(&["reports", "list", "--json"]);
    assert!(list.status.success());
    let reports = stdout_json(&list);
    assert_eq!(reports[0]["id"], id);
    assert_eq!(reports[0]["name"], "Week 13");
    assert_eq!(reports[0]["number_of_discrepancies"], 6);

    let show = env.run(&["reports", "show", &id.to_string(), "--json"]);
    let cases = stdout_json(&show);
    assert_eq!(cases.as_array().unwrap().len(), 6);
    assert_eq!(cases[0]["CaseID"], "1003");
    assert_eq!(cases[0]["ReasonID"], 1);

    let stats = env.run(&["reports", "stats", &id.to_string()]);
    assert!(stats.status.success());
    assert!(String::from_utf8_lossy(&stats.stdout).contains("Botulism"));

    let renamed = env.run(&["reports", "rename", &id.to_string(), ""]);
    assert!(renamed.status.success());
    let reports = stdout_json(&env.run(&["reports", "list", "--json"]));
    assert_eq!(reports[0]["name"], format!("Report {id}"));

    assert!(env.run(&["reports", "delete", &id.to_string()]).status.success());
    let gone = env.run(&["reports", "show", &id.to_string()]);
    assert_eq!(gone.status.code(), Some(5));
}

#[test]
fn persist_with_archive() {
    let env = Env::new();
    let archive = env.path("archive");
    let set = env.run(&["settings", "set", "archive_path", archive.to_str().unwrap()]);
    assert!(set.status.success(), "stderr: {}", stderr(&set));

    let get = env.run(&["settings", "get", "archive_path"]);
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), archive.to_str().unwrap());

    let output = env.compare("out", &["--persist", "--archive", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let id = stdout_json(&output)["report_id"].as_i64().unwrap();

    let archived = archive.join(id.to_string());
    assert_eq!(read(&archived.join("results.csv")), read(&env.path("out/results.csv")));
    assert!(archived.join("stats.csv").exists());
}

#[test]
fn archive_without_path_is_usage_error() {
    let env = Env::new();
    let output = env.compare("out", &["--persist", "--archive"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("archive_path"));
    assert!(!env.path("out").exists());

    // Once the archive path is set the same output directory is still free
    let output = env.run(&["settings", "set", "archive_path", env.path("archive").to_str().unwrap()]);
    assert!(output.status.success());
    let output = env.compare("out", &["--persist", "--archive"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(env.path("out/results.csv").exists());
}

#[test]
fn settings_file_disables_filter() {
    let env = Env::new();
    let config = env.path("config/caserecon");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(config.join("settings.json"), r#"{ "compare.filterByEventCode": false }"#).unwrap();

    let output = env.compare("out", &["--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout_json(&output)["summary"]["total_divergences"], 7);
}

#[test]
fn unknown_setting_is_usage_error() {
    let env = Env::new();
    let output = env.run(&["settings", "get", "password"]);
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// bench-data
// ===========================================================================

#[test]
fn bench_data_feeds_compare() {
    let env = Env::new();
    let bench = env.path("bench");
    let state = fixture("state.csv");
    let cdc = fixture("cdc.csv");
    let output = env.run(&[
        "bench-data",
        "-a",
        state.to_str().unwrap(),
        "-s",
        cdc.to_str().unwrap(),
        "--rows",
        "200",
        "--seed",
        "42",
        "-o",
        bench.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let auth = bench.join("authoritative_bench.csv");
    let sec = bench.join("secondary_bench.csv");
    assert_eq!(read(&auth).lines().count(), 201);
    assert_eq!(read(&sec).lines().count(), 201);

    let out = env.path("out");
    let output = env.run(&[
        "compare",
        "-a",
        auth.to_str().unwrap(),
        "-s",
        sec.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
        "--no-filter",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json = stdout_json(&output);
    // CaseIDs are unique and shared by both files
    assert_eq!(json["summary"]["duplicates"], 0);
    assert_eq!(json["summary"]["missing_from_secondary"], 0);
}
