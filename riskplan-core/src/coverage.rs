//! Measure coverage per risk
//!
//! Global invariants enforced:
//! - Pure projection of (selection × library × risks); nothing is stored
//! - A measure with no applicable risks applies to every risk
//! - A category with no relevant measures is uncovered, never "covered by default"
//!
//! Measures reference risks by stable risk id. Libraries that still reference
//! risks by display name go through `legacy::rekey_applicable_risks` first.

pub mod legacy;

use crate::measure::{Category, Measure, MeasureLibrary};
use crate::risk::{join_keys, Risk};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Names of the measures selected for a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSelection", into = "Vec<String>")]
pub struct SelectedMeasures {
    names: BTreeSet<String>,
}

/// Selections are stored either as `{name: bool}` flags or as a name list
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSelection {
    Flags(BTreeMap<String, bool>),
    Names(Vec<String>),
}

impl From<StoredSelection> for SelectedMeasures {
    fn from(stored: StoredSelection) -> Self {
        match stored {
            StoredSelection::Flags(flags) => SelectedMeasures::from_flags(&flags),
            StoredSelection::Names(names) => names.into_iter().collect(),
        }
    }
}

impl From<SelectedMeasures> for Vec<String> {
    fn from(selected: SelectedMeasures) -> Self {
        selected.names.into_iter().collect()
    }
}

impl FromIterator<String> for SelectedMeasures {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        SelectedMeasures {
            names: iter.into_iter().collect(),
        }
    }
}

impl SelectedMeasures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only names flagged `true`
    pub fn from_flags(flags: &BTreeMap<String, bool>) -> Self {
        flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.names.remove(name);
    }

    /// Copy with `name` flipped
    pub fn toggle(&self, name: &str) -> Self {
        let mut next = self.clone();
        if !next.names.remove(name) {
            next.names.insert(name.to_string());
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Measures of the library that apply to `risk_key`, grouped by category
pub fn relevant_measures(risk_key: &str, library: &MeasureLibrary) -> MeasureLibrary {
    let pick = |measures: &[Measure]| -> Vec<Measure> {
        measures
            .iter()
            .filter(|m| m.applies_to(risk_key))
            .cloned()
            .collect()
    };
    MeasureLibrary {
        prevention: pick(&library.prevention),
        detection: pick(&library.detection),
        reaction: pick(&library.reaction),
    }
}

/// P/D/R flags for one risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    #[serde(rename = "P")]
    pub prevention: bool,
    #[serde(rename = "D")]
    pub detection: bool,
    #[serde(rename = "R")]
    pub reaction: bool,
}

impl Coverage {
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Prevention => self.prevention,
            Category::Detection => self.detection,
            Category::Reaction => self.reaction,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.prevention && self.detection && self.reaction
    }
}

fn any_selected(measures: &[Measure], selected: &SelectedMeasures) -> bool {
    measures.iter().any(|m| selected.contains(&m.name))
}

/// Whether each category has at least one selected measure applicable to `risk_key`
pub fn coverage(risk_key: &str, selected: &SelectedMeasures, library: &MeasureLibrary) -> Coverage {
    let relevant = relevant_measures(risk_key, library);
    Coverage {
        prevention: any_selected(&relevant.prevention, selected),
        detection: any_selected(&relevant.detection, selected),
        reaction: any_selected(&relevant.reaction, selected),
    }
}

/// Per-category state with the "nothing applicable" case kept distinct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageStatus {
    Covered,
    Uncovered,
    NoMeasures,
}

impl CoverageStatus {
    fn from_parts(covered: bool, relevant: usize) -> Self {
        if relevant == 0 {
            CoverageStatus::NoMeasures
        } else if covered {
            CoverageStatus::Covered
        } else {
            CoverageStatus::Uncovered
        }
    }
}

/// One line of the coverage overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCoverage {
    pub risk_id: String,
    pub risk_name: String,
    pub coverage: Coverage,
    pub status: BTreeMap<Category, CoverageStatus>,
    pub relevant_counts: BTreeMap<Category, usize>,
}

/// Coverage of every risk, matched by join key, in input order
pub fn coverage_report(
    risks: &[Risk],
    selected: &SelectedMeasures,
    library: &MeasureLibrary,
) -> Vec<RiskCoverage> {
    risks
        .iter()
        .zip(join_keys(risks))
        .map(|(risk, key)| {
            let relevant = relevant_measures(key, library);
            let cov = coverage(key, selected, library);
            let mut status = BTreeMap::new();
            let mut relevant_counts = BTreeMap::new();
            for category in Category::ALL {
                let count = relevant.get(category).len();
                relevant_counts.insert(category, count);
                status.insert(category, CoverageStatus::from_parts(cov.get(category), count));
            }
            RiskCoverage {
                risk_id: risk.id.clone(),
                risk_name: risk.name.clone(),
                coverage: cov,
                status,
                relevant_counts,
            }
        })
        .collect()
}
