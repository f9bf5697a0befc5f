// File I/O operations

pub mod archive;
pub mod csv;
pub mod report;
pub mod store;

/// Report store schema version
/// Increment when schema changes in a way that old versions can't read
pub const STORE_SCHEMA_VERSION: u32 = 1;
