// Configuration loading

pub mod settings;

pub use settings::Settings;

/// Environment variable that overrides `store.path`
pub const STORE_ENV: &str = "CASERECON_STORE";
