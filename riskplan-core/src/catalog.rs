//! Search, band filter and ordering over assessed risks
//!
//! Global invariants enforced:
//! - Sorting is stable: ties keep input order
//! - Filtering preserves input order

use crate::risk::AssessedRisk;
use feruca::Collator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Band filter; `all` is a pass-through sentinel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BandFilter {
    #[default]
    All,
    Only(String),
}

impl FromStr for BandFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "all" {
            BandFilter::All
        } else {
            BandFilter::Only(s.to_string())
        })
    }
}

impl fmt::Display for BandFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandFilter::All => write!(f, "all"),
            BandFilter::Only(id) => write!(f, "{}", id),
        }
    }
}

/// Search criteria for `filter_risks`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskFilter {
    pub text: String,
    pub band: BandFilter,
}

/// Ordering for `sort_risks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    ScoreDesc,
    ScoreAsc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::ScoreDesc => "scoreDesc",
            SortKey::ScoreAsc => "scoreAsc",
            SortKey::NameAsc => "nameAsc",
            SortKey::NameDesc => "nameDesc",
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scoreDesc" => Ok(SortKey::ScoreDesc),
            "scoreAsc" => Ok(SortKey::ScoreAsc),
            "nameAsc" => Ok(SortKey::NameAsc),
            "nameDesc" => Ok(SortKey::NameDesc),
            other => anyhow::bail!(
                "unknown sort key '{}' (expected scoreDesc, scoreAsc, nameAsc or nameDesc)",
                other
            ),
        }
    }
}

fn matches_text(risk: &AssessedRisk, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    risk.name.to_lowercase().contains(needle)
        || risk
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn matches_band(risk: &AssessedRisk, band: &BandFilter) -> bool {
    match band {
        BandFilter::All => true,
        BandFilter::Only(id) => risk.band_id.as_deref().unwrap_or("") == id,
    }
}

/// Case-insensitive substring search on name/description plus band filter
pub fn filter_risks(risks: &[AssessedRisk], filter: &RiskFilter) -> Vec<AssessedRisk> {
    let needle = filter.text.trim().to_lowercase();
    risks
        .iter()
        .filter(|r| matches_text(r, &needle) && matches_band(r, &filter.band))
        .cloned()
        .collect()
}

/// Stable sort by the given key
///
/// Names are ordered with the Unicode collation algorithm, so accented
/// letters sort beside their base letter.
pub fn sort_risks(risks: &[AssessedRisk], key: SortKey) -> Vec<AssessedRisk> {
    let mut sorted = risks.to_vec();
    match key {
        SortKey::ScoreDesc => sorted.sort_by(|a, b| b.score.cmp(&a.score)),
        SortKey::ScoreAsc => sorted.sort_by(|a, b| a.score.cmp(&b.score)),
        SortKey::NameAsc => {
            let mut collator = Collator::default();
            sorted.sort_by(|a, b| collator.collate(a.name.as_str(), b.name.as_str()));
        }
        SortKey::NameDesc => {
            let mut collator = Collator::default();
            sorted.sort_by(|a, b| collator.collate(b.name.as_str(), a.name.as_str()));
        }
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessed(id: &str, name: &str, score: i32, band: Option<&str>) -> AssessedRisk {
        AssessedRisk {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            probability: 1,
            impact: score,
            score,
            band_id: band.map(str::to_string),
            band_label: None,
        }
    }

    fn sample() -> Vec<AssessedRisk> {
        let mut drone = assessed("1", "Přelet nepovoleného dronu", 6, Some("low"));
        drone.description = Some("Bezpilotní prostředek nad AREÁLEM".to_string());
        vec![
            drone,
            assessed("2", "Krádeže", 6, Some("low")),
            assessed("3", "Nájezd vozidla do davu", 20, Some("high")),
            assessed("4", "Braní rukojmí", 25, Some("critical")),
            assessed("5", "Neznámé", 0, None),
        ]
    }

    #[test]
    fn test_filter_all_passes_everything() {
        let filtered = filter_risks(&sample(), &RiskFilter::default());
        assert_eq!(filtered.len(), 5);
    }

    #[test]
    fn test_filter_text_is_case_insensitive_on_description() {
        let filter = RiskFilter {
            text: "  areálem ".to_string(),
            band: BandFilter::All,
        };
        let filtered = filter_risks(&sample(), &filter);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "1");
    }

    #[test]
    fn test_filter_by_band() {
        let filter = RiskFilter {
            text: String::new(),
            band: "low".parse().unwrap(),
        };
        let ids: Vec<_> = filter_risks(&sample(), &filter)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_filter_combines_text_and_band() {
        let filter = RiskFilter {
            text: "VOZIDLA".to_string(),
            band: BandFilter::Only("low".to_string()),
        };
        assert!(filter_risks(&sample(), &filter).is_empty());
    }

    #[test]
    fn test_sort_score_desc_is_stable() {
        let ids: Vec<_> = sort_risks(&sample(), SortKey::ScoreDesc)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["4", "3", "1", "2", "5"]);
    }

    #[test]
    fn test_sort_score_asc_is_stable() {
        let ids: Vec<_> = sort_risks(&sample(), SortKey::ScoreAsc)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["5", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_sort_by_name() {
        let risks = vec![
            assessed("a", "beta", 1, None),
            assessed("b", "Alfa", 1, None),
            assessed("c", "gama", 1, None),
        ];
        let asc: Vec<_> = sort_risks(&risks, SortKey::NameAsc)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(asc, vec!["Alfa", "beta", "gama"]);

        let desc: Vec<_> = sort_risks(&risks, SortKey::NameDesc)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(desc, vec!["gama", "beta", "Alfa"]);
    }

    #[test]
    fn test_sort_by_name_collates_accents() {
        let risks = vec![
            assessed("a", "Zebra", 1, None),
            assessed("b", "Dav", 1, None),
            assessed("c", "Čas", 1, None),
            assessed("d", "Šance", 1, None),
        ];
        let asc: Vec<_> = sort_risks(&risks, SortKey::NameAsc)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(asc, vec!["Čas", "Dav", "Šance", "Zebra"]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("nameDesc".parse::<SortKey>().unwrap(), SortKey::NameDesc);
        assert!("random".parse::<SortKey>().is_err());
        assert_eq!(SortKey::ScoreAsc.as_str(), "scoreAsc");
    }
}
