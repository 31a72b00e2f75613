//! Risk policy: a validated scale plus its band partition
//!
//! A `RiskPolicy` can only be obtained through validation, so every scoring
//! and matrix call made through it runs against a well-formed configuration.

use crate::band::{default_bands, to_band, validate_bands, Band};
use crate::error::ConfigError;
use crate::scale::{Scale, DEFAULT_SCALE};
use crate::scoring::{score_risk, ScoredRisk};
use serde::Serialize;

/// Organizational risk-appetite policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskPolicy {
    scale: Scale,
    bands: Vec<Band>,
}

impl RiskPolicy {
    /// Validate and build a policy. Fails loudly on a broken configuration.
    pub fn new(scale: Scale, bands: Vec<Band>) -> Result<Self, ConfigError> {
        validate_bands(&bands, &scale)?;
        Ok(RiskPolicy { scale, bands })
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn score(&self, probability: f64, impact: f64) -> ScoredRisk {
        score_risk(probability, impact, &self.scale)
    }

    pub fn classify(&self, score: i32) -> Option<&Band> {
        to_band(score, &self.bands)
    }

    pub fn band(&self, id: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.id == id)
    }
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy {
            scale: DEFAULT_SCALE,
            bands: default_bands(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_matches_validated() {
        let validated = RiskPolicy::new(DEFAULT_SCALE, default_bands()).unwrap();
        assert_eq!(validated, RiskPolicy::default());
    }

    #[test]
    fn test_custom_policy() {
        let scale = Scale::new(1, 10).unwrap();
        let bands = vec![
            Band::new("acceptable", "Acceptable", 1, 30),
            Band::new("unacceptable", "Unacceptable", 31, 100),
        ];
        let policy = RiskPolicy::new(scale, bands).unwrap();
        let scored = policy.score(6.0, 6.0);
        assert_eq!(scored.score, 36);
        assert_eq!(
            policy.classify(scored.score).map(|b| b.id.as_str()),
            Some("unacceptable")
        );
        assert_eq!(policy.band("acceptable").map(|b| b.max), Some(30));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        assert!(RiskPolicy::new(Scale { min: 4, max: 2 }, default_bands()).is_err());
        assert!(RiskPolicy::new(Scale { min: 1, max: 6 }, default_bands()).is_err());
    }
}
