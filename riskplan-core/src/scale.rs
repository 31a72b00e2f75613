//! Input scales and tolerant clamping
//!
//! Global invariants enforced:
//! - Clamping is total: every f64 (NaN and infinities included) maps into the scale
//! - Clamping is idempotent
//! - Scale validation happens at setup, never at scoring time

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Legal range for a single-criterion score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scale {
    pub min: i32,
    pub max: i32,
}

/// Simple probability/impact model (1..5)
pub const DEFAULT_SCALE: Scale = Scale { min: 1, max: 5 };

/// Per-criterion scale of the detailed seven-factor threat model (1..7)
pub const CRITERION_SCALE: Scale = Scale { min: 1, max: 7 };

impl Default for Scale {
    fn default() -> Self {
        DEFAULT_SCALE
    }
}

impl Scale {
    pub fn new(min: i32, max: i32) -> Result<Self, ConfigError> {
        let scale = Scale { min, max };
        validate_scale(&scale)?;
        Ok(scale)
    }

    /// Number of integer steps on the scale
    pub fn len(&self) -> usize {
        (i64::from(self.max) - i64::from(self.min) + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer steps from min to max
    pub fn steps(&self) -> impl DoubleEndedIterator<Item = i32> {
        self.min..=self.max
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Lowest and highest product of two values on this scale
    pub fn score_range(&self) -> (i32, i32) {
        let corners = [
            i64::from(self.min) * i64::from(self.min),
            i64::from(self.min) * i64::from(self.max),
            i64::from(self.max) * i64::from(self.max),
        ];
        let lo = corners.iter().copied().min().unwrap_or(0);
        let hi = corners.iter().copied().max().unwrap_or(0);
        (saturate(lo), saturate(hi))
    }
}

fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Most integer steps a configured scale may have; the matrix is steps².
pub const MAX_SCALE_STEPS: usize = 100;

/// Largest absolute bound of a configured scale
pub const MAX_SCALE_MAGNITUDE: i32 = 1000;

/// Reject a scale whose min is not strictly below its max, or that is too
/// large to render as a matrix
pub fn validate_scale(scale: &Scale) -> Result<(), ConfigError> {
    if scale.min >= scale.max {
        return Err(ConfigError::InvalidScale {
            min: scale.min,
            max: scale.max,
        });
    }
    if scale.min < -MAX_SCALE_MAGNITUDE || scale.max > MAX_SCALE_MAGNITUDE {
        return Err(ConfigError::ScaleOutOfBounds {
            min: scale.min,
            max: scale.max,
            limit: MAX_SCALE_MAGNITUDE,
        });
    }
    if scale.len() > MAX_SCALE_STEPS {
        return Err(ConfigError::ScaleTooWide {
            min: scale.min,
            max: scale.max,
            limit: MAX_SCALE_STEPS,
        });
    }
    Ok(())
}

/// Round to the nearest integer (halves toward +inf), then clamp into the scale.
///
/// NaN resolves to `scale.min`. Never panics, even on an unvalidated scale.
pub fn clamp_to_scale(value: f64, scale: &Scale) -> i32 {
    if value.is_nan() {
        log::debug!("non-numeric score clamped to scale minimum {}", scale.min);
        return scale.min;
    }
    let rounded = (value + 0.5).floor();
    let clamped = rounded
        .max(f64::from(scale.min))
        .min(f64::from(scale.max));
    if clamped != value {
        log::debug!("score {} clamped to {}", value, clamped);
    }
    clamped as i32
}

/// Coerce a stored JSON value to a number the way a dynamic `Number()` cast does.
///
/// - numbers pass through
/// - strings are trimmed; empty is 0, unparsable is NaN
/// - booleans are 1 / 0, null is 0
/// - arrays and objects are NaN
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Serde adapter for loosely typed numeric fields.
///
/// Pair with `#[serde(default = "...")]` to decide what a missing field means.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}
