//! Score bands
//!
//! Global invariants enforced:
//! - A validated band set partitions the attainable score range of its scale
//!   (no gaps, no overlaps)
//! - Band lookup is first-match in declaration order

use crate::error::ConfigError;
use crate::scale::{validate_scale, Scale};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fallback text for a score that matches no band
pub const UNCLASSIFIED_LABEL: &str = "—";

/// Named, inclusive score range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Band {
    pub id: String,
    pub label: String,
    pub min: i32,
    pub max: i32,
}

impl Band {
    pub fn new(id: &str, label: &str, min: i32, max: i32) -> Self {
        Band {
            id: id.to_string(),
            label: label.to_string(),
            min,
            max,
        }
    }

    pub fn contains(&self, score: i32) -> bool {
        score >= self.min && score <= self.max
    }
}

/// Default partition of the 1..25 score range.
///
/// Thresholds must stay exactly as they are; saved projects are interpreted
/// against them.
pub fn default_bands() -> Vec<Band> {
    vec![
        Band::new("low", "Nízké", 1, 6),
        Band::new("medium", "Střední", 7, 12),
        Band::new("high", "Vysoké", 13, 20),
        Band::new("critical", "Kritické", 21, 25),
    ]
}

/// First band whose inclusive range contains `score`, or `None` (unclassified)
pub fn to_band(score: i32, bands: &[Band]) -> Option<&Band> {
    bands.iter().find(|b| b.contains(score))
}

/// Check that `bands` partition every score attainable on `scale`
///
/// Bands must be non-empty, well-formed, uniquely named and ordered by
/// ascending `min`. Bands may extend past the attainable range.
pub fn validate_bands(bands: &[Band], scale: &Scale) -> Result<(), ConfigError> {
    validate_scale(scale)?;

    if bands.is_empty() {
        return Err(ConfigError::EmptyBands);
    }

    let mut seen = HashSet::new();
    for band in bands {
        if band.min > band.max {
            return Err(ConfigError::InvertedBand {
                id: band.id.clone(),
                min: band.min,
                max: band.max,
            });
        }
        if !seen.insert(band.id.as_str()) {
            return Err(ConfigError::DuplicateBandId(band.id.clone()));
        }
    }

    for pair in bands.windows(2) {
        if pair[1].min < pair[0].min {
            return Err(ConfigError::UnorderedBands {
                previous: pair[0].id.clone(),
                next: pair[1].id.clone(),
            });
        }
    }

    let (lo, hi) = scale.score_range();
    let hi = i64::from(hi);
    let mut cursor = i64::from(lo);
    let mut previous: Option<&Band> = None;

    for band in bands {
        if let Some(prev) = previous {
            if band.min <= prev.max {
                return Err(ConfigError::Overlap {
                    score: band.min,
                    first: prev.id.clone(),
                    second: band.id.clone(),
                });
            }
        }
        if cursor <= hi && i64::from(band.min) > cursor {
            return Err(ConfigError::Gap {
                score: cursor as i32,
            });
        }
        cursor = cursor.max(i64::from(band.max) + 1);
        previous = Some(band);
    }

    if cursor <= hi {
        return Err(ConfigError::Gap {
            score: cursor as i32,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::DEFAULT_SCALE;

    #[test]
    fn test_default_bands_are_valid() {
        validate_bands(&default_bands(), &DEFAULT_SCALE).expect("default bands should be valid");
    }

    #[test]
    fn test_default_band_boundaries() {
        let bands = default_bands();
        assert_eq!(to_band(1, &bands).map(|b| b.id.as_str()), Some("low"));
        assert_eq!(to_band(6, &bands).map(|b| b.id.as_str()), Some("low"));
        assert_eq!(to_band(7, &bands).map(|b| b.id.as_str()), Some("medium"));
        assert_eq!(to_band(12, &bands).map(|b| b.id.as_str()), Some("medium"));
        assert_eq!(to_band(13, &bands).map(|b| b.id.as_str()), Some("high"));
        assert_eq!(to_band(20, &bands).map(|b| b.id.as_str()), Some("high"));
        assert_eq!(to_band(21, &bands).map(|b| b.id.as_str()), Some("critical"));
        assert_eq!(to_band(25, &bands).map(|b| b.id.as_str()), Some("critical"));
    }

    #[test]
    fn test_unclassified_score() {
        let bands = default_bands();
        assert!(to_band(0, &bands).is_none());
        assert!(to_band(26, &bands).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let bands = vec![Band::new("a", "A", 1, 10), Band::new("b", "B", 5, 25)];
        assert_eq!(to_band(7, &bands).map(|b| b.id.as_str()), Some("a"));
    }

    #[test]
    fn test_reject_gap() {
        let bands = vec![Band::new("low", "Low", 1, 6), Band::new("high", "High", 8, 25)];
        assert_eq!(
            validate_bands(&bands, &DEFAULT_SCALE),
            Err(ConfigError::Gap { score: 7 })
        );
    }

    #[test]
    fn test_reject_gap_at_top() {
        let bands = vec![Band::new("low", "Low", 1, 20)];
        assert_eq!(
            validate_bands(&bands, &DEFAULT_SCALE),
            Err(ConfigError::Gap { score: 21 })
        );
    }

    #[test]
    fn test_reject_gap_at_bottom() {
        let bands = vec![Band::new("rest", "Rest", 2, 25)];
        assert_eq!(
            validate_bands(&bands, &DEFAULT_SCALE),
            Err(ConfigError::Gap { score: 1 })
        );
    }

    #[test]
    fn test_reject_overlap() {
        let bands = vec![Band::new("low", "Low", 1, 7), Band::new("high", "High", 7, 25)];
        assert!(matches!(
            validate_bands(&bands, &DEFAULT_SCALE),
            Err(ConfigError::Overlap { score: 7, .. })
        ));
    }

    #[test]
    fn test_reject_unordered() {
        let bands = vec![Band::new("high", "High", 7, 25), Band::new("low", "Low", 1, 6)];
        assert!(matches!(
            validate_bands(&bands, &DEFAULT_SCALE),
            Err(ConfigError::UnorderedBands { .. })
        ));
    }

    #[test]
    fn test_reject_inverted_and_duplicate() {
        let inverted = vec![Band::new("x", "X", 25, 1)];
        assert!(matches!(
            validate_bands(&inverted, &DEFAULT_SCALE),
            Err(ConfigError::InvertedBand { .. })
        ));

        let duplicate = vec![Band::new("x", "X", 1, 10), Band::new("x", "X", 11, 25)];
        assert_eq!(
            validate_bands(&duplicate, &DEFAULT_SCALE),
            Err(ConfigError::DuplicateBandId("x".to_string()))
        );
    }

    #[test]
    fn test_reject_empty() {
        assert_eq!(
            validate_bands(&[], &DEFAULT_SCALE),
            Err(ConfigError::EmptyBands)
        );
    }

    #[test]
    fn test_default_bands_do_not_cover_wider_scale() {
        let wide = Scale { min: 1, max: 10 };
        assert_eq!(
            validate_bands(&default_bands(), &wide),
            Err(ConfigError::Gap { score: 26 })
        );
    }

    #[test]
    fn test_bands_may_extend_past_range() {
        let bands = vec![Band::new("low", "Low", -10, 10), Band::new("high", "High", 11, 1000)];
        assert!(validate_bands(&bands, &DEFAULT_SCALE).is_ok());
    }
}
