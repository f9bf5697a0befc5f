use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Counters for one event code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCodeStats {
    pub event_name: String,
    pub total_cases: u64,
    pub total_duplicates: u64,
    pub total_missing_from_secondary: u64,
    pub total_missing_from_authoritative: u64,
    pub total_wrong_attributes: u64,
}

impl EventCodeStats {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            ..Self::default()
        }
    }

    pub fn total_divergences(&self) -> u64 {
        self.total_duplicates
            + self.total_missing_from_secondary
            + self.total_missing_from_authoritative
            + self.total_wrong_attributes
    }
}

/// Event code → counters. Entries are created lazily the first time either
/// side mentions a code; the event name recorded is the one seen first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsByEventCode {
    entries: BTreeMap<String, EventCodeStats>,
}

impl StatsByEventCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for `event_code`, initialized with `event_name` if unseen.
    pub fn entry(&mut self, event_code: &str, event_name: &str) -> &mut EventCodeStats {
        self.entries
            .entry(event_code.to_string())
            .or_insert_with(|| EventCodeStats::new(event_name))
    }

    pub fn get(&self, event_code: &str) -> Option<&EventCodeStats> {
        self.entries.get(event_code)
    }

    pub fn contains(&self, event_code: &str) -> bool {
        self.entries.contains_key(event_code)
    }

    pub fn insert(&mut self, event_code: impl Into<String>, stats: EventCodeStats) {
        self.entries.insert(event_code.into(), stats);
    }

    /// Entries ordered by event code.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventCodeStats)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every entry's counters. The event name is left empty.
    pub fn totals(&self) -> EventCodeStats {
        self.entries.values().fold(EventCodeStats::default(), |mut acc, s| {
            acc.total_cases += s.total_cases;
            acc.total_duplicates += s.total_duplicates;
            acc.total_missing_from_secondary += s.total_missing_from_secondary;
            acc.total_missing_from_authoritative += s.total_missing_from_authoritative;
            acc.total_wrong_attributes += s.total_wrong_attributes;
            acc
        })
    }
}
