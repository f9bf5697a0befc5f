//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad args, invalid options file, unknown key) |
//! | 3    | Divergences found (`compare --fail-on-divergence` only)   |
//! | 4    | Input parse error (CSV shape, missing column, add_time)   |
//! | 5    | Report store error                                        |
//! | 6    | I/O error (read/write/copy)                               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid options, unknown setting.
/// Also what clap exits with on argument errors.
pub const EXIT_USAGE: u8 = 2;

/// The comparison ran and produced at least one divergence.
pub const EXIT_DIVERGENCES: u8 = 3;

/// An input dataset could not be parsed.
pub const EXIT_PARSE: u8 = 4;

/// Report store could not be opened, queried or updated,
/// or the requested report does not exist.
pub const EXIT_STORE: u8 = 5;

/// Reading inputs or writing report files failed.
pub const EXIT_IO: u8 = 6;
