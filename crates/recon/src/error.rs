use std::fmt;

use crate::model::Side;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Options validation error (empty attribute name, duplicates, etc.).
    ConfigValidation(String),
    /// Missing required column in input data.
    MissingColumn { side: Side, column: String },
    /// `add_time` of a colliding authoritative record matches neither format.
    TimestampParse { case_id: String, value: String },
    /// Malformed CSV row.
    Csv { side: Side, line: Option<u64>, message: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "options parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "options validation error: {msg}"),
            Self::MissingColumn { side, column } => {
                write!(f, "{side} dataset: missing column '{column}'")
            }
            Self::TimestampParse { case_id, value } => {
                write!(f, "authoritative case '{case_id}': cannot parse add_time '{value}'")
            }
            Self::Csv { side, line: Some(line), message } => {
                write!(f, "{side} dataset, line {line}: {message}")
            }
            Self::Csv { side, line: None, message } => write!(f, "{side} dataset: {message}"),
        }
    }
}

impl std::error::Error for ReconError {}
