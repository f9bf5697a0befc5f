//! `caserecon-recon`: case dataset reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records, returns divergences and
//! per-event-code statistics. No CLI or file IO beyond parsing CSV text.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod index;
pub mod matcher;
pub mod model;

pub use aggregate::{EventCodeStats, StatsByEventCode};
pub use config::{AttributeSelection, CompareOptions, EventCodeFilter};
pub use engine::{load_csv_records, run};
pub use error::ReconError;
pub use model::{Divergence, Findings, ReasonCode, ReconInput, ReconResult, Record, Side};
