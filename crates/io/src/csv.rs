// Dataset file reading

use std::io::Read;
use std::path::Path;

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
///
/// A leading UTF-8 byte-order mark is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    // Try UTF-8 first; on failure, recover the buffer from the error
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            log::debug!("input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caserecon_recon::{load_csv_records, Side};
    use tempfile::tempdir;

    #[test]
    fn reads_utf8_with_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cdc.csv");
        std::fs::write(&path, "\u{feff}CaseID,EventCode\n1,10\n").unwrap();
        let text = read_file_as_utf8(&path).unwrap();
        assert!(text.starts_with("CaseID"));
    }

    #[test]
    fn falls_back_to_windows_1252() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.csv");
        // "Québec" with é as 0xE9
        std::fs::write(&path, b"CaseID,EventCode,County\n1,10,Qu\xe9bec\n").unwrap();
        let text = read_file_as_utf8(&path).unwrap();
        let records = load_csv_records(Side::Authoritative, &text).unwrap();
        assert_eq!(records[0].get("County"), Some("Québec"));
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_file_as_utf8(Path::new("/nonexistent/state.csv")).unwrap_err();
        assert!(err.contains("/nonexistent/state.csv"));
    }
}
