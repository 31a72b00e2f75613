//! Detailed seven-criterion threat scoring
//!
//! Three criteria feed probability (3..21) and four feed impact (4..28).
//!
//! Global invariants enforced:
//! - Every criterion always holds a value in 1..=7 (missing/garbage input resolves to 1)
//! - Totals are computed on every read, never stored
//! - Edits return a new assessment; inputs are never mutated

use crate::scale::{clamp_to_scale, coerce_number, CRITERION_SCALE};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Which axis a criterion contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Probability,
    Impact,
}

/// One of the seven scoring criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    Availability,
    Occurrence,
    Complexity,
    LifeAndHealth,
    Facility,
    Financial,
    Community,
}

impl Criterion {
    pub const ALL: [Criterion; 7] = [
        Criterion::Availability,
        Criterion::Occurrence,
        Criterion::Complexity,
        Criterion::LifeAndHealth,
        Criterion::Facility,
        Criterion::Financial,
        Criterion::Community,
    ];

    /// Stored field name
    pub fn key(&self) -> &'static str {
        match self {
            Criterion::Availability => "availability",
            Criterion::Occurrence => "occurrence",
            Criterion::Complexity => "complexity",
            Criterion::LifeAndHealth => "lifeAndHealth",
            Criterion::Facility => "facility",
            Criterion::Financial => "financial",
            Criterion::Community => "community",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Availability => "Availability of attack means",
            Criterion::Occurrence => "Occurrence of this attack type",
            Criterion::Complexity => "Complexity of execution",
            Criterion::LifeAndHealth => "Impact on life and health",
            Criterion::Facility => "Impact on the facility",
            Criterion::Financial => "Financial impact",
            Criterion::Community => "Impact on the affected community",
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Criterion::Availability | Criterion::Occurrence | Criterion::Complexity => {
                Axis::Probability
            }
            _ => Axis::Impact,
        }
    }

    pub fn on_axis(axis: Axis) -> impl Iterator<Item = Criterion> {
        Criterion::ALL.into_iter().filter(move |c| c.axis() == axis)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Criterion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown criterion '{}'", s))
    }
}

fn default_criterion() -> i32 {
    CRITERION_SCALE.min
}

fn deserialize_criterion<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(clamp_to_scale(coerce_number(&value), &CRITERION_SCALE))
}

fn default_source() -> String {
    "custom".to_string()
}

/// Scoring progress of a threat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatState {
    Unscored,
    Scored,
}

/// Threat entry of an object or campus threat analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAssessment {
    #[serde(deserialize_with = "crate::risk::deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub availability: i32,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub occurrence: i32,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub complexity: i32,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub life_and_health: i32,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub facility: i32,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub financial: i32,
    #[serde(default = "default_criterion", deserialize_with = "deserialize_criterion")]
    pub community: i32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub scored: bool,
}

/// Derived probability and impact sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatTotals {
    pub probability_total: i32,
    pub impact_total: i32,
}

impl ThreatAssessment {
    /// New entry with every criterion at its default
    pub fn new(id: &str, name: &str, source: &str) -> Self {
        let d = default_criterion();
        ThreatAssessment {
            id: id.to_string(),
            name: name.to_string(),
            source: source.to_string(),
            availability: d,
            occurrence: d,
            complexity: d,
            life_and_health: d,
            facility: d,
            financial: d,
            community: d,
            scored: false,
        }
    }

    pub fn get(&self, criterion: Criterion) -> i32 {
        match criterion {
            Criterion::Availability => self.availability,
            Criterion::Occurrence => self.occurrence,
            Criterion::Complexity => self.complexity,
            Criterion::LifeAndHealth => self.life_and_health,
            Criterion::Facility => self.facility,
            Criterion::Financial => self.financial,
            Criterion::Community => self.community,
        }
    }

    fn slot(&mut self, criterion: Criterion) -> &mut i32 {
        match criterion {
            Criterion::Availability => &mut self.availability,
            Criterion::Occurrence => &mut self.occurrence,
            Criterion::Complexity => &mut self.complexity,
            Criterion::LifeAndHealth => &mut self.life_and_health,
            Criterion::Facility => &mut self.facility,
            Criterion::Financial => &mut self.financial,
            Criterion::Community => &mut self.community,
        }
    }

    /// Copy of this threat with one criterion set (clamped to 1..=7).
    ///
    /// Any edit moves the threat to `Scored`.
    pub fn update_criterion(&self, criterion: Criterion, value: f64) -> Self {
        let mut next = self.clone();
        *next.slot(criterion) = clamp_to_scale(value, &CRITERION_SCALE);
        next.scored = true;
        next
    }

    /// Apply a batch of edits in order
    pub fn apply_scores(&self, edits: &[(Criterion, f64)]) -> Self {
        edits
            .iter()
            .fold(self.clone(), |t, (c, v)| t.update_criterion(*c, *v))
    }

    pub fn axis_total(&self, axis: Axis) -> i32 {
        Criterion::on_axis(axis).map(|c| self.get(c)).sum()
    }

    pub fn totals(&self) -> ThreatTotals {
        ThreatTotals {
            probability_total: self.axis_total(Axis::Probability),
            impact_total: self.axis_total(Axis::Impact),
        }
    }

    pub fn state(&self) -> ThreatState {
        let untouched = Criterion::ALL
            .iter()
            .all(|c| self.get(*c) == default_criterion());
        if self.scored || !untouched {
            ThreatState::Scored
        } else {
            ThreatState::Unscored
        }
    }
}

/// Template group of methodology threats
#[derive(Debug, Clone, Copy)]
pub struct ThreatGroup {
    pub key: &'static str,
    pub name: &'static str,
    pub threats: &'static [&'static str],
}

const THREAT_GROUPS: &[ThreatGroup] = &[
    ThreatGroup {
        key: "basic",
        name: "Basic threats (crime, insider threats)",
        threats: &[
            "Napadení chladnou zbraní (bodné, sečné, tupé apod.)",
            "Napadení střelnou zbraní (krátkou, dlouhou)",
            "Žhářský útok",
            "Braní rukojmí a barikádová situace",
            "Napadení měkkého cíle davem (násilná shromáždění)",
            "Výbušnina v poštovní zásilce",
            "Jedovatá látka v poštovní zásilce",
            "Nastražená imitace výbušniny",
            "Umístění výbušniny do prostoru (bez přítomnosti útočníka)",
            "Falešné oznámení o umístění výbušniny",
        ],
    },
    ThreatGroup {
        key: "organizedCrime",
        name: "Organized crime",
        threats: &["Výbušnina v zaparkovaném vozidle", "Únos osoby"],
    },
    ThreatGroup {
        key: "hateCrime",
        name: "Hate crime",
        threats: &[
            "Fyzické napadení v blízkém okolí objektu",
            "Verbální agrese s hanlivými prvky",
        ],
    },
    ThreatGroup {
        key: "terrorism",
        name: "Terrorism",
        threats: &[
            "Sebevražedný útok s použitím výbušniny",
            "Nájezd vozidla s výbušninou se sebevražedným útočníkem",
            "Útok nájezdem vozidla do lidí",
        ],
    },
];

pub fn threat_groups() -> &'static [ThreatGroup] {
    THREAT_GROUPS
}

pub fn threat_group(key: &str) -> Option<&'static ThreatGroup> {
    THREAT_GROUPS.iter().find(|g| g.key == key)
}

/// Add every threat of a template group, skipping names already present.
///
/// Unknown group keys leave the list unchanged.
pub fn add_threat_group(
    threats: &[ThreatAssessment],
    group_key: &str,
    next_id: &mut impl FnMut() -> String,
) -> Vec<ThreatAssessment> {
    let mut out = threats.to_vec();
    let Some(group) = threat_group(group_key) else {
        log::warn!("unknown threat group '{}'", group_key);
        return out;
    };
    for name in group.threats {
        if out.iter().any(|t| t.name == *name) {
            continue;
        }
        out.push(ThreatAssessment::new(&next_id(), name, group.key));
    }
    out
}

/// Append a custom threat. Blank names leave the list unchanged.
pub fn add_custom_threat(
    threats: &[ThreatAssessment],
    name: &str,
    id: String,
) -> Vec<ThreatAssessment> {
    let mut out = threats.to_vec();
    if name.trim().is_empty() {
        return out;
    }
    out.push(ThreatAssessment::new(&id, name, "custom"));
    out
}

/// Save a batch of criterion edits onto the threat with `id`
pub fn save_scores(
    threats: &[ThreatAssessment],
    id: &str,
    edits: &[(Criterion, f64)],
) -> Vec<ThreatAssessment> {
    threats
        .iter()
        .map(|t| {
            if t.id == id {
                t.apply_scores(edits)
            } else {
                t.clone()
            }
        })
        .collect()
}

pub fn remove_threat(threats: &[ThreatAssessment], id: &str) -> Vec<ThreatAssessment> {
    threats.iter().filter(|t| t.id != id).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("t{}", n)
        }
    }

    #[test]
    fn test_default_totals() {
        let t = ThreatAssessment::new("t1", "Žhářský útok", "basic");
        assert_eq!(
            t.totals(),
            ThreatTotals {
                probability_total: 3,
                impact_total: 4
            }
        );
        assert_eq!(t.state(), ThreatState::Unscored);
    }

    #[test]
    fn test_update_recomputes_totals() {
        let t = ThreatAssessment::new("t1", "Žhářský útok", "basic");
        let updated = t.update_criterion(Criterion::Availability, 7.0);
        assert_eq!(updated.totals().probability_total, 9);
        assert_eq!(updated.totals().impact_total, 4);
        assert_eq!(t.availability, 1, "input must not be mutated");
    }

    #[test]
    fn test_update_clamps_to_criterion_scale() {
        let t = ThreatAssessment::new("t1", "X", "custom");
        assert_eq!(t.update_criterion(Criterion::Facility, 12.0).facility, 7);
        assert_eq!(t.update_criterion(Criterion::Facility, -3.0).facility, 1);
        assert_eq!(t.update_criterion(Criterion::Facility, f64::NAN).facility, 1);
        assert_eq!(t.update_criterion(Criterion::Facility, 4.6).facility, 5);
    }

    #[test]
    fn test_first_edit_marks_scored_even_at_default() {
        let t = ThreatAssessment::new("t1", "X", "custom");
        let edited = t.update_criterion(Criterion::Community, 1.0);
        assert_eq!(edited.state(), ThreatState::Scored);
    }

    #[test]
    fn test_max_totals() {
        let edits: Vec<_> = Criterion::ALL.iter().map(|c| (*c, 7.0)).collect();
        let t = ThreatAssessment::new("t1", "X", "custom").apply_scores(&edits);
        assert_eq!(
            t.totals(),
            ThreatTotals {
                probability_total: 21,
                impact_total: 28
            }
        );
    }

    #[test]
    fn test_deserialize_defaults_and_garbage() {
        let json = r#"{
            "id": "a",
            "name": "Únos osoby",
            "source": "organizedCrime",
            "availability": 4,
            "occurrence": 0,
            "complexity": "6",
            "lifeAndHealth": null,
            "financial": 99
        }"#;
        let t: ThreatAssessment = serde_json::from_str(json).unwrap();
        assert_eq!(t.availability, 4);
        assert_eq!(t.occurrence, 1);
        assert_eq!(t.complexity, 6);
        assert_eq!(t.life_and_health, 1);
        assert_eq!(t.facility, 1);
        assert_eq!(t.financial, 7);
        assert_eq!(t.state(), ThreatState::Scored);
    }

    #[test]
    fn test_criterion_keys_round_trip_through_from_str() {
        for c in Criterion::ALL {
            assert_eq!(c.key().parse::<Criterion>().unwrap(), c);
        }
        assert!("speed".parse::<Criterion>().is_err());
        assert_eq!(Criterion::on_axis(Axis::Probability).count(), 3);
        assert_eq!(Criterion::on_axis(Axis::Impact).count(), 4);
    }

    #[test]
    fn test_add_threat_group_dedupes_by_name() {
        let mut next = ids();
        let first = add_threat_group(&[], "terrorism", &mut next);
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|t| t.source == "terrorism"));

        let again = add_threat_group(&first, "terrorism", &mut next);
        assert_eq!(again.len(), 3);

        let unknown = add_threat_group(&first, "weather", &mut next);
        assert_eq!(unknown.len(), 3);
    }

    #[test]
    fn test_add_custom_and_remove() {
        let threats = add_custom_threat(&[], "Drone overflight", "c1".to_string());
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].source, "custom");
        assert_eq!(add_custom_threat(&threats, "   ", "c2".to_string()).len(), 1);
        assert!(remove_threat(&threats, "c1").is_empty());
    }

    #[test]
    fn test_save_scores_targets_one_threat() {
        let threats = vec![
            ThreatAssessment::new("a", "A", "custom"),
            ThreatAssessment::new("b", "B", "custom"),
        ];
        let saved = save_scores(
            &threats,
            "b",
            &[(Criterion::Occurrence, 5.0), (Criterion::Financial, 3.0)],
        );
        assert_eq!(saved[0], threats[0]);
        assert_eq!(saved[1].totals().probability_total, 7);
        assert_eq!(saved[1].totals().impact_total, 6);
    }
}
