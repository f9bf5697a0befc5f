use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level options
// ---------------------------------------------------------------------------

/// Per-run comparison options.
///
/// ```toml
/// event_code_filter = "harvest_from_secondary"
///
/// [attributes]
/// mode = "listed"
/// names = ["EventCode", "MMWRYear", "MMWRWeek"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    pub attributes: AttributeSelection,
    pub event_code_filter: EventCodeFilter,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Which attributes are compared between matched records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "names", rename_all = "snake_case")]
pub enum AttributeSelection {
    /// Every field present on the authoritative record being compared.
    #[default]
    AllAuthoritativeFields,
    /// Exactly these fields, in this order.
    Listed(Vec<String>),
}

impl AttributeSelection {
    pub fn listed<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Listed(names.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Event code filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCodeFilter {
    /// Every authoritative record with a numeric event code is indexed.
    #[default]
    Disabled,
    /// Only authoritative records whose event code appears somewhere in the
    /// secondary dataset are indexed.
    HarvestFromSecondary,
}

impl EventCodeFilter {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::HarvestFromSecondary)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl CompareOptions {
    pub fn new(attributes: AttributeSelection, event_code_filter: EventCodeFilter) -> Self {
        Self {
            attributes,
            event_code_filter,
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let options: CompareOptions =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if let AttributeSelection::Listed(names) = &self.attributes {
            let mut seen = HashSet::new();
            for name in names {
                if name.trim().is_empty() {
                    return Err(ReconError::ConfigValidation(
                        "attribute names must not be empty".into(),
                    ));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ReconError::ConfigValidation(format!(
                        "attribute '{name}' listed more than once"
                    )));
                }
            }
        }
        Ok(())
    }
}
