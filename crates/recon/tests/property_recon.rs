// Property-based tests for the reconciliation engine.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::{BTreeMap, HashMap, HashSet};

use proptest::prelude::*;
use caserecon_recon::config::{AttributeSelection, CompareOptions, EventCodeFilter};
use caserecon_recon::engine::run;
use caserecon_recon::model::{ReasonCode, ReconInput, Record};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Small key space so both sides overlap and collide often.
fn arb_case_id() -> impl Strategy<Value = String> {
    (0u8..12).prop_map(|n| format!("C{n}"))
}

fn arb_event_code() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec!["10", "20", "30"]).prop_map(str::to_string),
        1 => Just("MAPPING".to_string()),
    ]
}

fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(vec!["1", "2", "Confirmed"]).prop_map(str::to_string),
        1 => Just(String::new()),
        1 => Just("NULL".to_string()),
    ]
}

/// Distinct timestamps per row so recency never hits an exact tie.
fn arb_authoritative() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((arb_case_id(), arb_event_code(), arb_value()), 0..20).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (id, code, week))| {
                Record::from_pairs([
                    ("CaseID".to_string(), id),
                    ("EventCode".to_string(), code.clone()),
                    ("EventName".to_string(), format!("Event {code}")),
                    ("MMWRWeek".to_string(), week),
                    ("add_time".to_string(), format!("2024-01-01 00:00:{:02}.{:03}", i / 10, i % 10)),
                ])
            })
            .collect()
    })
}

fn arb_secondary() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((arb_case_id(), arb_event_code(), arb_value()), 0..20).prop_map(|rows| {
        rows.into_iter()
            .map(|(id, code, week)| {
                Record::from_pairs([
                    ("CaseID".to_string(), id),
                    ("EventCode".to_string(), code.clone()),
                    ("EventName".to_string(), format!("Event {code}")),
                    ("MMWRWeek".to_string(), week),
                ])
            })
            .collect()
    })
}

fn arb_options() -> impl Strategy<Value = CompareOptions> {
    (any::<bool>(), any::<bool>()).prop_map(|(filter, listed)| {
        CompareOptions::new(
            if listed {
                AttributeSelection::listed(["MMWRWeek"])
            } else {
                AttributeSelection::AllAuthoritativeFields
            },
            if filter {
                EventCodeFilter::HarvestFromSecondary
            } else {
                EventCodeFilter::Disabled
            },
        )
    })
}

fn divergence_multiset(input: &ReconInput, options: &CompareOptions) -> BTreeMap<(String, u8, String), usize> {
    let result = run(options, input.clone()).unwrap();
    let mut out = BTreeMap::new();
    for d in result.divergences {
        *out.entry((d.case_id, d.reason_id.code(), d.reason)).or_insert(0) += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn idempotence(
        authoritative in arb_authoritative(),
        secondary in arb_secondary(),
        options in arb_options(),
    ) {
        let input = ReconInput { authoritative, secondary };
        let first = run(&options, input.clone()).unwrap();
        let second = run(&options, input.clone()).unwrap();
        prop_assert_eq!(&first.stats, &second.stats);
        prop_assert_eq!(divergence_multiset(&input, &options), divergence_multiset(&input, &options));
    }
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn one_sided_cases_partition(
        authoritative in arb_authoritative(),
        secondary in arb_secondary(),
        options in arb_options(),
    ) {
        let harvested: HashSet<String> = secondary.iter().map(|r| r.event_code().to_string()).collect();
        let auth_ids: HashSet<String> = authoritative
            .iter()
            .filter(|r| r.event_code().bytes().all(|b| b.is_ascii_digit()))
            .filter(|r| !options.event_code_filter.is_enabled() || harvested.contains(r.event_code()))
            .map(|r| r.case_id().to_string())
            .collect();
        let sec_ids: HashSet<String> = secondary.iter().map(|r| r.case_id().to_string()).collect();

        let result = run(&options, ReconInput { authoritative, secondary }).unwrap();

        let mut per_case: HashMap<&str, Vec<ReasonCode>> = HashMap::new();
        for d in &result.divergences {
            if d.reason_id != ReasonCode::DuplicateInSecondary {
                per_case.entry(d.case_id.as_str()).or_default().push(d.reason_id);
            }
        }

        for id in auth_ids.symmetric_difference(&sec_ids) {
            let expected = if auth_ids.contains(id) {
                ReasonCode::MissingFromSecondary
            } else {
                ReasonCode::MissingFromAuthoritative
            };
            prop_assert_eq!(per_case.get(id.as_str()).cloned(), Some(vec![expected]));
        }

        for id in auth_ids.intersection(&sec_ids) {
            let reasons = per_case.get(id.as_str()).cloned().unwrap_or_default();
            prop_assert!(reasons.is_empty() || reasons == vec![ReasonCode::AttributeMismatch]);
        }

        let totals = result.stats.totals();
        prop_assert_eq!(totals.total_cases as usize, auth_ids.union(&sec_ids).count());
    }
}

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn duplicate_count_is_k_minus_one(secondary in arb_secondary()) {
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for r in &secondary {
            *occurrences.entry(r.case_id().to_string()).or_insert(0) += 1;
        }

        let result = run(
            &CompareOptions::default(),
            ReconInput { authoritative: vec![], secondary },
        )
        .unwrap();

        let mut duplicates: HashMap<&str, usize> = HashMap::new();
        for d in &result.divergences {
            if d.reason_id == ReasonCode::DuplicateInSecondary {
                *duplicates.entry(d.case_id.as_str()).or_insert(0) += 1;
            }
        }

        for (id, k) in &occurrences {
            prop_assert_eq!(duplicates.get(id.as_str()).copied().unwrap_or(0), k - 1);
        }
        prop_assert_eq!(result.summary.duplicates as u64, result.stats.totals().total_duplicates);
    }
}
