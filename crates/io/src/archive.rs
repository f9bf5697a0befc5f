// Archive copies of report directories

use std::path::{Path, PathBuf};

use crate::report::{RESULTS_FILE, STATS_FILE};

/// Copy `results.csv` and `stats.csv` from `report_dir` into
/// `<archive_root>/<report_id>/`. Returns the archive directory.
pub fn archive_report(archive_root: &Path, report_id: i64, report_dir: &Path) -> Result<PathBuf, String> {
    let target = archive_root.join(report_id.to_string());
    std::fs::create_dir_all(&target).map_err(|e| format!("{}: {}", target.display(), e))?;

    for name in [RESULTS_FILE, STATS_FILE] {
        let from = report_dir.join(name);
        let to = target.join(name);
        std::fs::copy(&from, &to).map_err(|e| format!("{}: {}", from.display(), e))?;
    }

    log::info!("archived report {} to {}", report_id, target.display());
    Ok(target)
}
