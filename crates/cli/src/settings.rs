//! `caserecon settings`: key/value settings kept in the report store.

use clap::Subcommand;

use caserecon_config::Settings;

use crate::compare::ARCHIVE_PATH_KEY;
use crate::{open_store, CliError};

const KNOWN_KEYS: &[&str] = &[ARCHIVE_PATH_KEY];

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print a setting (empty output if unset)
    Get { key: String },

    /// Set a setting
    Set { key: String, value: String },
}

pub fn cmd_settings(cmd: SettingsCommands) -> Result<(), CliError> {
    let settings = Settings::load();

    match cmd {
        SettingsCommands::Get { key } => {
            check_key(&key)?;
            let store = open_store(&settings)?;
            if let Some(value) = store.get_setting(&key).map_err(CliError::store)? {
                println!("{value}");
            }
        }
        SettingsCommands::Set { key, value } => {
            check_key(&key)?;
            let store = open_store(&settings)?;
            store.set_setting(&key, &value).map_err(CliError::store)?;
            eprintln!("{key} = {value}");
        }
    }
    Ok(())
}

fn check_key(key: &str) -> Result<(), CliError> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(CliError::args(format!("unknown setting \"{key}\""))
            .with_hint(format!("known settings: {}", KNOWN_KEYS.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_keys() {
        assert!(check_key("archive_path").is_ok());
        let err = check_key("password").unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert!(err.hint.unwrap().contains("archive_path"));
    }
}
