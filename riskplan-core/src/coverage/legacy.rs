//! Rekeying of measure libraries that reference risks by display name
//!
//! Older libraries (including the built-in one) list applicable risks by
//! name. Coverage matches by each risk's join key (see `risk::join_keys`), so
//! such libraries are rewritten once against the project's risk list before
//! use.

use crate::measure::Measure;
use crate::risk::{join_keys, Risk};
use std::collections::{HashMap, HashSet};

/// Result of rekeying a library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RekeyOutcome {
    pub measures: Vec<Measure>,
    /// (measure id, reference) pairs that matched no risk key, id or name
    pub unresolved: Vec<(String, String)>,
}

/// Rewrite applicable-risk references to risk join keys.
///
/// A reference that already is a join key is kept. A reference equal to a
/// risk name (exact, case-sensitive) or to an id shared by several risks
/// expands to the keys of every such risk. Anything else is kept verbatim.
pub fn rekey_applicable_risks(measures: &[Measure], risks: &[Risk]) -> RekeyOutcome {
    let keys = join_keys(risks);
    let key_set: HashSet<&str> = keys.iter().copied().filter(|k| !k.is_empty()).collect();

    let mut aliases: HashMap<&str, Vec<&str>> = HashMap::new();
    for (risk, &key) in risks.iter().zip(&keys) {
        if key.is_empty() {
            continue;
        }
        for alias in [risk.name.as_str(), risk.id.as_str()] {
            if alias.is_empty() || alias == key {
                continue;
            }
            let targets = aliases.entry(alias).or_default();
            if !targets.contains(&key) {
                targets.push(key);
            }
        }
    }

    let mut unresolved = Vec::new();
    let measures = measures
        .iter()
        .map(|measure| {
            let mut rekeyed = measure.clone();
            rekeyed.applicable_risks.clear();
            for reference in &measure.applicable_risks {
                let mut targets: Vec<&str> = Vec::new();
                if key_set.contains(reference.as_str()) {
                    targets.push(reference.as_str());
                }
                if let Some(expanded) = aliases.get(reference.as_str()) {
                    targets.extend(expanded.iter().copied());
                }
                if targets.is_empty() {
                    unresolved.push((measure.id.clone(), reference.clone()));
                    targets.push(reference.as_str());
                }
                for target in targets {
                    if !rekeyed.applicable_risks.iter().any(|r| r == target) {
                        rekeyed.applicable_risks.push(target.to_string());
                    }
                }
            }
            rekeyed
        })
        .collect();

    if !unresolved.is_empty() {
        log::warn!(
            "{} measure reference(s) match no risk in the project; kept as-is",
            unresolved.len()
        );
        for (measure, reference) in &unresolved {
            log::debug!("measure '{}': unresolved risk reference '{}'", measure, reference);
        }
    }

    RekeyOutcome {
        measures,
        unresolved,
    }
}
