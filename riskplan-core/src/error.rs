//! Configuration errors
//!
//! Only scale and band setup can fail. Per-value anomalies (out-of-range,
//! fractional or non-numeric scores) are resolved by clamping and never
//! surface here.

/// A broken risk policy: malformed scale or a band set that does not
/// partition the attainable score range.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scale.min ({min}) must be less than scale.max ({max})")]
    InvalidScale { min: i32, max: i32 },

    #[error("scale {min}..{max} has more than {limit} steps")]
    ScaleTooWide { min: i32, max: i32, limit: usize },

    #[error("scale bounds must lie within -{limit}..{limit} (got {min}..{max})")]
    ScaleOutOfBounds { min: i32, max: i32, limit: i32 },

    #[error("band set is empty")]
    EmptyBands,

    #[error("band '{id}' has min ({min}) greater than max ({max})")]
    InvertedBand { id: String, min: i32, max: i32 },

    #[error("band id '{0}' is used more than once")]
    DuplicateBandId(String),

    #[error("bands must be ordered by ascending min ('{previous}' precedes '{next}')")]
    UnorderedBands { previous: String, next: String },

    #[error("score {score} is not covered by any band")]
    Gap { score: i32 },

    #[error("score {score} is covered by both '{first}' and '{second}'")]
    Overlap {
        score: i32,
        first: String,
        second: String,
    },
}
