//! Mitigating measures and the measure library
//!
//! Stored measures come in several historical shapes; all of them are
//! normalized into `Measure` on deserialization.
//!
//! Global invariants enforced:
//! - An empty applicable-risk list means "applies to every risk"
//! - A measure may sit in several categories and is listed under each

use crate::authz::{AuthorizationContext, Capability};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_MEASURES_JSON: &str = include_str!("../data/default_measures.json");
const DEFAULT_RISK_NAMES_JSON: &str = include_str!("../data/risk_names.json");

/// Prevention / detection / reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Prevention,
    Detection,
    Reaction,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Prevention, Category::Detection, Category::Reaction];

    /// Accepts English ids and the Czech ids found in older documents
    pub fn from_key(key: &str) -> Option<Category> {
        match key.trim().to_lowercase().as_str() {
            "prevention" | "prevence" => Some(Category::Prevention),
            "detection" | "detekce" => Some(Category::Detection),
            "reaction" | "reakce" => Some(Category::Reaction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Prevention => "prevention",
            Category::Detection => "detection",
            Category::Reaction => "reaction",
        }
    }

    /// Single-letter flag used in coverage indicators
    pub fn letter(&self) -> char {
        match self {
            Category::Prevention => 'P',
            Category::Detection => 'D',
            Category::Reaction => 'R',
        }
    }
}

/// A mitigating security control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMeasure")]
pub struct Measure {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub categories: Vec<Category>,
    /// Risk keys this measure applies to; empty applies to all
    pub applicable_risks: Vec<String>,
}

impl Measure {
    pub fn new(id: &str, name: &str, categories: &[Category]) -> Self {
        Measure {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            categories: normalize_categories(categories.iter().copied()),
            applicable_risks: Vec::new(),
        }
    }

    pub fn applicable_to(mut self, risks: &[&str]) -> Self {
        self.applicable_risks = risks.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.applicable_risks.is_empty()
    }

    /// Exact-match applicability against a risk key
    pub fn applies_to(&self, risk_key: &str) -> bool {
        self.is_wildcard() || self.applicable_risks.iter().any(|r| r == risk_key)
    }

    pub fn in_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }
}

fn normalize_categories(iter: impl IntoIterator<Item = Category>) -> Vec<Category> {
    let mut cats: Vec<Category> = iter.into_iter().collect();
    cats.sort();
    cats.dedup();
    cats
}

/// Every shape a measure has been stored in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMeasure {
    #[serde(default, deserialize_with = "crate::risk::deserialize_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    is_prevention: bool,
    #[serde(default)]
    is_detection: bool,
    #[serde(default)]
    is_reaction: bool,
    #[serde(default)]
    applicable_risks: Option<Vec<String>>,
}

impl From<StoredMeasure> for Measure {
    fn from(stored: StoredMeasure) -> Self {
        let keys: Vec<String> = match (stored.categories, stored.category) {
            (Some(list), _) => list,
            (None, Some(single)) => vec![single],
            (None, None) => Vec::new(),
        };
        let mut categories: Vec<Category> = keys
            .iter()
            .filter_map(|k| {
                let cat = Category::from_key(k);
                if cat.is_none() {
                    log::debug!("measure '{}': ignoring unknown category '{}'", stored.id, k);
                }
                cat
            })
            .collect();
        if keys.is_empty() {
            let flags = [
                (stored.is_prevention, Category::Prevention),
                (stored.is_detection, Category::Detection),
                (stored.is_reaction, Category::Reaction),
            ];
            categories.extend(flags.iter().filter(|(on, _)| *on).map(|(_, c)| *c));
        }

        Measure {
            id: stored.id,
            name: stored.name.or(stored.text).unwrap_or_default(),
            description: stored.description,
            categories: normalize_categories(categories),
            applicable_risks: stored.applicable_risks.unwrap_or_default(),
        }
    }
}

/// Measures grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureLibrary {
    #[serde(default)]
    pub prevention: Vec<Measure>,
    #[serde(default)]
    pub detection: Vec<Measure>,
    #[serde(default)]
    pub reaction: Vec<Measure>,
}

impl MeasureLibrary {
    /// Group a flat measure list; a multi-category measure lands in each group
    pub fn from_measures<'a>(measures: impl IntoIterator<Item = &'a Measure>) -> Self {
        let mut library = MeasureLibrary::default();
        for measure in measures {
            for category in &measure.categories {
                library.get_mut(*category).push(measure.clone());
            }
        }
        library
    }

    pub fn get(&self, category: Category) -> &[Measure] {
        match category {
            Category::Prevention => &self.prevention,
            Category::Detection => &self.detection,
            Category::Reaction => &self.reaction,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<Measure> {
        match category {
            Category::Prevention => &mut self.prevention,
            Category::Detection => &mut self.detection,
            Category::Reaction => &mut self.reaction,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_empty())
    }
}

/// Built-in measure library used for new users and library resets
pub fn default_measures() -> Result<Vec<Measure>> {
    serde_json::from_str(DEFAULT_MEASURES_JSON).context("failed to parse built-in measure library")
}

/// Built-in list of risk names the default library refers to
pub fn default_risk_names() -> Result<Vec<String>> {
    serde_json::from_str(DEFAULT_RISK_NAMES_JSON).context("failed to parse built-in risk names")
}

/// Pick the effective library: personal, then global, then built-in
pub fn resolve_library(
    personal: Option<&[Measure]>,
    global: Option<&[Measure]>,
) -> Result<Vec<Measure>> {
    if let Some(items) = personal.filter(|m| !m.is_empty()) {
        return Ok(items.to_vec());
    }
    if let Some(items) = global.filter(|m| !m.is_empty()) {
        log::debug!("personal measure library empty; using global template");
        return Ok(items.to_vec());
    }
    log::debug!("no stored measure library; using built-in defaults");
    default_measures()
}

/// Which library an edit is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryScope {
    Personal,
    Global,
}

impl LibraryScope {
    /// Global only for admins who switched admin mode on
    pub fn for_user(authz: &dyn AuthorizationContext, user: &str, admin_mode: bool) -> Self {
        if admin_mode && authz.has_capability(user, Capability::Admin) {
            LibraryScope::Global
        } else {
            LibraryScope::Personal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::StaticRoleStore;

    #[test]
    fn test_normalize_flag_shape() {
        let json = r#"{"id": "m1", "text": "Kontrola pošty", "isPrevention": false,
                       "isDetection": true, "isReaction": true,
                       "applicableRisks": ["Anonymní výhrůžka"]}"#;
        let m: Measure = serde_json::from_str(json).unwrap();
        assert_eq!(m.name, "Kontrola pošty");
        assert_eq!(m.categories, vec![Category::Detection, Category::Reaction]);
        assert!(m.applies_to("Anonymní výhrůžka"));
        assert!(!m.applies_to("Krádeže"));
    }

    #[test]
    fn test_normalize_single_czech_category() {
        let json = r#"{"name": "CCTV dohled", "category": "detekce",
                       "description": "Živý dohled", "source": "seed"}"#;
        let m: Measure = serde_json::from_str(json).unwrap();
        assert_eq!(m.categories, vec![Category::Detection]);
        assert!(m.is_wildcard());
        assert!(m.applies_to("anything"));
        assert_eq!(m.description.as_deref(), Some("Živý dohled"));
    }

    #[test]
    fn test_normalize_categories_list_drops_unknown() {
        let json = r#"{"name": "X", "categories": ["reakce", "prevention", "magic", "reaction"],
                       "applicableRisks": null}"#;
        let m: Measure = serde_json::from_str(json).unwrap();
        assert_eq!(m.categories, vec![Category::Prevention, Category::Reaction]);
        assert!(m.is_wildcard());
    }

    #[test]
    fn test_library_groups_multi_category() {
        let measures = vec![
            Measure::new("1", "Guards", &[Category::Prevention, Category::Reaction]),
            Measure::new("2", "CCTV", &[Category::Detection]),
        ];
        let library = MeasureLibrary::from_measures(&measures);
        assert_eq!(library.prevention.len(), 1);
        assert_eq!(library.detection.len(), 1);
        assert_eq!(library.reaction.len(), 1);
        assert_eq!(library.reaction[0].name, "Guards");
    }

    #[test]
    fn test_default_library_loads() {
        let measures = default_measures().unwrap();
        assert_eq!(measures.len(), 22);
        assert!(measures.iter().all(|m| !m.name.is_empty()));
        assert!(measures.iter().all(|m| !m.categories.is_empty()));
        assert_eq!(default_risk_names().unwrap().len(), 26);
    }

    #[test]
    fn test_resolve_library_fallback_chain() {
        let personal = vec![Measure::new("p", "Personal", &[Category::Prevention])];
        let global = vec![Measure::new("g", "Global", &[Category::Detection])];

        let lib = resolve_library(Some(personal.as_slice()), Some(global.as_slice())).unwrap();
        assert_eq!(lib[0].id, "p");

        let lib = resolve_library(Some(&[][..]), Some(global.as_slice())).unwrap();
        assert_eq!(lib[0].id, "g");

        let lib = resolve_library(None, None).unwrap();
        assert_eq!(lib.len(), 22);
    }

    #[test]
    fn test_library_scope() {
        let roles = StaticRoleStore::with_admins(["admin-1"]);
        assert_eq!(LibraryScope::for_user(&roles, "admin-1", true), LibraryScope::Global);
        assert_eq!(LibraryScope::for_user(&roles, "admin-1", false), LibraryScope::Personal);
        assert_eq!(LibraryScope::for_user(&roles, "user-2", true), LibraryScope::Personal);
    }
}
