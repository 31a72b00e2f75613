//! Risk records (simple probability × impact model)
//!
//! Global invariants enforced:
//! - Assessment never mutates input records
//! - Assessed output preserves input order
//! - Stored probability/impact may be garbage; assessment always clamps
//! - A blank key never selects a risk

use crate::policy::RiskPolicy;
use crate::scale::{clamp_to_scale, deserialize_lenient, Scale};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

fn missing_score() -> f64 {
    f64::NAN
}

/// A risk as stored in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "missing_score", deserialize_with = "deserialize_lenient")]
    pub probability: f64,
    #[serde(default = "missing_score", deserialize_with = "deserialize_lenient")]
    pub impact: f64,
}

impl Risk {
    pub fn new(id: &str, name: &str, probability: f64, impact: f64) -> Self {
        Risk {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            category: None,
            probability,
            impact,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Serde adapter for stored ids, which may be strings or numbers.
///
/// Numbers keep their JSON spelling; `null` is a blank id.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {}",
            other
        ))),
    }
}

/// Key each risk is matched on, in input order.
///
/// That is the risk's id when it is non-blank and unique in `risks`, and its
/// name otherwise. Risks sharing a name fall back to the same key.
pub fn join_keys(risks: &[Risk]) -> Vec<&str> {
    let mut id_counts: HashMap<&str, usize> = HashMap::new();
    for risk in risks {
        if !risk.id.trim().is_empty() {
            *id_counts.entry(risk.id.as_str()).or_default() += 1;
        }
    }

    let keys: Vec<&str> = risks
        .iter()
        .map(|r| {
            if id_counts.get(r.id.as_str()) == Some(&1) {
                r.id.as_str()
            } else {
                r.name.as_str()
            }
        })
        .collect();

    let by_name = risks
        .iter()
        .zip(&keys)
        .filter(|(r, k)| r.id != **k)
        .count();
    if by_name > 0 {
        log::warn!(
            "{} risk(s) have a blank or shared id and are matched by name",
            by_name
        );
    }
    keys
}

/// A risk enriched with its clamped scores and band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedRisk {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub probability: i32,
    pub impact: i32,
    pub score: i32,
    pub band_id: Option<String>,
    pub band_label: Option<String>,
}

impl AssessedRisk {
    /// Band label, or the neutral placeholder when the score is unclassified
    pub fn band_display(&self) -> &str {
        self.band_label
            .as_deref()
            .unwrap_or(crate::band::UNCLASSIFIED_LABEL)
    }

    /// Display name, falling back to the id for unnamed risks
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Score and classify a single risk
pub fn assess_risk(risk: &Risk, policy: &RiskPolicy) -> AssessedRisk {
    let scored = policy.score(risk.probability, risk.impact);
    let band = policy.classify(scored.score);
    AssessedRisk {
        id: risk.id.clone(),
        name: risk.name.clone(),
        description: risk.description.clone(),
        probability: scored.probability,
        impact: scored.impact,
        score: scored.score,
        band_id: band.map(|b| b.id.clone()),
        band_label: band.map(|b| b.label.clone()),
    }
}

/// Enrich every risk, preserving input order
pub fn assess_risks(risks: &[Risk], policy: &RiskPolicy) -> Vec<AssessedRisk> {
    risks.iter().map(|r| assess_risk(r, policy)).collect()
}

/// Input for a manually added risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub probability: f64,
    pub impact: f64,
}

impl Default for RiskDraft {
    fn default() -> Self {
        RiskDraft {
            name: String::new(),
            description: String::new(),
            probability: 3.0,
            impact: 3.0,
        }
    }
}

/// Template entry used for bulk "add risk group"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "missing_score", deserialize_with = "deserialize_lenient")]
    pub probability: f64,
    #[serde(default = "missing_score", deserialize_with = "deserialize_lenient")]
    pub impact: f64,
}

/// Append a manually drafted risk. Blank names leave the list unchanged.
pub fn add_risk(risks: &[Risk], draft: &RiskDraft, id: String) -> Vec<Risk> {
    let mut out = risks.to_vec();
    let name = draft.name.trim();
    if name.is_empty() {
        return out;
    }
    let description = draft.description.trim();
    out.push(Risk {
        id,
        name: name.to_string(),
        description: (!description.is_empty()).then(|| description.to_string()),
        category: None,
        probability: draft.probability,
        impact: draft.impact,
    });
    out
}

/// Bulk-add template risks, skipping names already present
pub fn add_risk_group(
    risks: &[Risk],
    templates: &[RiskTemplate],
    next_id: &mut impl FnMut() -> String,
) -> Vec<Risk> {
    let mut out = risks.to_vec();
    for template in templates {
        if out.iter().any(|r| r.name == template.name) {
            continue;
        }
        out.push(Risk {
            id: next_id(),
            name: template.name.clone(),
            description: template.description.clone(),
            category: template.category.clone(),
            probability: template.probability,
            impact: template.impact,
        });
    }
    out
}

/// Replace the scores of the risk(s) with join `key`, clamped to `scale`
pub fn update_score(
    risks: &[Risk],
    key: &str,
    probability: f64,
    impact: f64,
    scale: &Scale,
) -> Vec<Risk> {
    let keys = join_keys(risks);
    risks
        .iter()
        .zip(keys)
        .map(|(r, k)| {
            if !key.is_empty() && k == key {
                Risk {
                    probability: f64::from(clamp_to_scale(probability, scale)),
                    impact: f64::from(clamp_to_scale(impact, scale)),
                    ..r.clone()
                }
            } else {
                r.clone()
            }
        })
        .collect()
}

/// Drop the risk(s) with join `key`
pub fn remove_risk(risks: &[Risk], key: &str) -> Vec<Risk> {
    if key.is_empty() {
        return risks.to_vec();
    }
    let keys = join_keys(risks);
    risks
        .iter()
        .zip(keys)
        .filter(|(_, k)| *k != key)
        .map(|(r, _)| r.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::DEFAULT_SCALE;

    fn ids() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("r{}", n)
        }
    }

    #[test]
    fn test_assess_risk() {
        let policy = RiskPolicy::default();
        let assessed = assess_risk(&Risk::new("a", "Krádeže", 3.0, 2.0), &policy);
        assert_eq!(assessed.score, 6);
        assert_eq!(assessed.band_id.as_deref(), Some("low"));
        assert_eq!(assessed.band_display(), "Nízké");
    }

    #[test]
    fn test_assess_garbage_input() {
        let json = r#"[
            {"id": "a", "name": "A", "probability": "4", "impact": 7},
            {"id": "b", "name": "B", "probability": "x"},
            {"id": "c", "name": "C", "probability": 2.6, "impact": null}
        ]"#;
        let risks: Vec<Risk> = serde_json::from_str(json).unwrap();
        let assessed = assess_risks(&risks, &RiskPolicy::default());
        assert_eq!((assessed[0].probability, assessed[0].impact), (4, 5));
        assert_eq!((assessed[1].probability, assessed[1].impact), (1, 1));
        assert_eq!((assessed[2].probability, assessed[2].impact), (3, 1));
    }

    #[test]
    fn test_band_display_placeholder() {
        let risk = Risk::new("a", "A", 5.0, 5.0);
        let policy = RiskPolicy::default();
        let assessed = assess_risk(&risk, &policy);
        assert!(assessed.band_id.is_some());

        let orphan = AssessedRisk {
            band_id: None,
            band_label: None,
            ..assessed
        };
        assert_eq!(orphan.band_display(), "—");
    }

    #[test]
    fn test_add_risk_trims_and_skips_blank() {
        let draft = RiskDraft {
            name: "  Požár ve stánkové zóně ".to_string(),
            description: " ".to_string(),
            ..RiskDraft::default()
        };
        let risks = add_risk(&[], &draft, "x1".to_string());
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].name, "Požár ve stánkové zóně");
        assert!(risks[0].description.is_none());
        assert_eq!(risks[0].probability, 3.0);

        let blank = RiskDraft::default();
        assert_eq!(add_risk(&risks, &blank, "x2".to_string()).len(), 1);
    }

    #[test]
    fn test_add_risk_group_skips_existing_names() {
        let existing = vec![Risk::new("old", "Krádeže", 3.0, 2.0)];
        let templates = vec![
            RiskTemplate {
                name: "Krádeže".to_string(),
                description: None,
                category: None,
                probability: 1.0,
                impact: 1.0,
            },
            RiskTemplate {
                name: "Tlačenice / panika".to_string(),
                description: None,
                category: Some("davová hrozba".to_string()),
                probability: 2.0,
                impact: 4.0,
            },
        ];
        let mut next = ids();
        let risks = add_risk_group(&existing, &templates, &mut next);
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].probability, 3.0);
        assert_eq!(risks[1].id, "r1");
        assert_eq!(risks[1].category.as_deref(), Some("davová hrozba"));
    }

    #[test]
    fn test_update_and_remove() {
        let risks = vec![Risk::new("a", "A", 1.0, 1.0), Risk::new("b", "B", 2.0, 2.0)];
        let updated = update_score(&risks, "b", 7.0, 3.4, &DEFAULT_SCALE);
        assert_eq!(updated[1].probability, 5.0);
        assert_eq!(updated[1].impact, 3.0);
        assert_eq!(updated[0], risks[0]);
        assert_eq!(risks[1].probability, 2.0, "input must not be mutated");

        let removed = remove_risk(&updated, "a");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "b");
    }

    #[test]
    fn test_numeric_ids_are_stringified() {
        let json = r#"[
            {"id": 1712345678901.42, "name": "Nové vlastní riziko"},
            {"id": 42, "name": "Krádeže"},
            {"id": null, "name": "Požár"}
        ]"#;
        let risks: Vec<Risk> = serde_json::from_str(json).unwrap();
        assert_eq!(risks[0].id, "1712345678901.42");
        assert_eq!(risks[1].id, "42");
        assert_eq!(risks[2].id, "");

        let bad: Result<Vec<Risk>, _> = serde_json::from_str(r#"[{"id": [1], "name": "X"}]"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_join_keys_fall_back_to_names() {
        let risks = vec![
            Risk::new("a", "Požár", 1.0, 1.0),
            Risk::new("", "Krádeže", 1.0, 1.0),
            Risk::new("dup", "Dron", 1.0, 1.0),
            Risk::new("dup", "Panika", 1.0, 1.0),
            Risk::new("  ", "Vandalismus", 1.0, 1.0),
        ];
        assert_eq!(
            join_keys(&risks),
            vec!["a", "Krádeže", "Dron", "Panika", "Vandalismus"]
        );
    }

    #[test]
    fn test_idless_risks_are_edited_one_at_a_time() {
        let json = r#"[{"name": "Požár"}, {"name": "Krádeže"}]"#;
        let risks: Vec<Risk> = serde_json::from_str(json).unwrap();

        let updated = update_score(&risks, "Krádeže", 4.0, 4.0, &DEFAULT_SCALE);
        assert!(updated[0].probability.is_nan());
        assert_eq!(updated[1].probability, 4.0);

        let untouched = update_score(&risks, "", 4.0, 4.0, &DEFAULT_SCALE);
        assert!(untouched.iter().all(|r| r.probability.is_nan()));

        assert_eq!(remove_risk(&risks, "").len(), 2);
        let removed = remove_risk(&risks, "Požár");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].name, "Krádeže");
    }
}
