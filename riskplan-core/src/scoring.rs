//! Probability × impact scoring
//!
//! Global invariants enforced:
//! - Scoring is total over f64 input (never errors, never panics)
//! - Score is monotonic in each axis
//! - Returned probability/impact are the clamped values actually scored

use crate::band::{to_band, Band};
use crate::scale::{clamp_to_scale, Scale};
use serde::{Deserialize, Serialize};

/// Result of scoring one risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredRisk {
    pub score: i32,
    pub probability: i32,
    pub impact: i32,
}

impl ScoredRisk {
    /// True when either input had to be corrected to fit the scale
    pub fn was_corrected(&self, probability: f64, impact: f64) -> bool {
        f64::from(self.probability) != probability || f64::from(self.impact) != impact
    }
}

/// Clamp both inputs into `scale` and multiply them.
///
/// Does not validate `scale`; that happens once when the policy is built.
pub fn score_risk(probability: f64, impact: f64, scale: &Scale) -> ScoredRisk {
    let p = clamp_to_scale(probability, scale);
    let i = clamp_to_scale(impact, scale);
    ScoredRisk {
        score: p.saturating_mul(i),
        probability: p,
        impact: i,
    }
}

/// Score and classify in one step
pub fn score_and_classify<'a>(
    probability: f64,
    impact: f64,
    scale: &Scale,
    bands: &'a [Band],
) -> (ScoredRisk, Option<&'a Band>) {
    let scored = score_risk(probability, impact, scale);
    let band = to_band(scored.score, bands);
    (scored, band)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::default_bands;
    use crate::scale::DEFAULT_SCALE;

    #[test]
    fn test_score_in_range() {
        let s = score_risk(3.0, 4.0, &DEFAULT_SCALE);
        assert_eq!(
            s,
            ScoredRisk {
                score: 12,
                probability: 3,
                impact: 4
            }
        );
        assert!(!s.was_corrected(3.0, 4.0));
    }

    #[test]
    fn test_score_clamps_inputs() {
        let s = score_risk(9.0, 0.2, &DEFAULT_SCALE);
        assert_eq!(s.probability, 5);
        assert_eq!(s.impact, 1);
        assert_eq!(s.score, 5);
        assert!(s.was_corrected(9.0, 0.2));
    }

    #[test]
    fn test_nan_probability_clamps_to_min() {
        let s = score_risk(f64::NAN, 3.0, &DEFAULT_SCALE);
        assert_eq!(s.probability, 1);
        assert_eq!(s.impact, 3);
        assert_eq!(s.score, 3);
    }

    #[test]
    fn test_score_and_classify() {
        let bands = default_bands();
        let (scored, band) = score_and_classify(5.0, 5.0, &DEFAULT_SCALE, &bands);
        assert_eq!(scored.score, 25);
        assert_eq!(band.map(|b| b.id.as_str()), Some("critical"));

        let (scored, band) = score_and_classify(2.0, 3.0, &DEFAULT_SCALE, &bands);
        assert_eq!(scored.score, 6);
        assert_eq!(band.map(|b| b.id.as_str()), Some("low"));
    }

    #[test]
    fn test_score_honours_wider_scale() {
        let wide = Scale { min: 1, max: 10 };
        let s = score_risk(10.0, 9.0, &wide);
        assert_eq!(s.score, 90);
    }
}
