//! Risk matrix and threat scatter
//!
//! Global invariants enforced:
//! - Grid rows run impact high → low, columns probability low → high
//!   (top-left is high impact / low probability)
//! - The simple 1..5 grid and the 3..21 / 4..28 scatter are separate domains
//!   and are never mixed in one view

use crate::policy::RiskPolicy;
use crate::risk::AssessedRisk;
use crate::scale::CRITERION_SCALE;
use crate::threat::{Axis, Criterion, ThreatAssessment};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// One grid point of the probability × impact matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub probability: i32,
    pub impact: i32,
    pub score: i32,
    pub band_id: Option<String>,
}

/// Build the full grid for a policy, rows ordered impact descending
pub fn make_matrix(policy: &RiskPolicy) -> Vec<Vec<MatrixCell>> {
    let scale = policy.scale();
    scale
        .steps()
        .rev()
        .map(|impact| {
            scale
                .steps()
                .map(|probability| {
                    let scored = policy.score(f64::from(probability), f64::from(impact));
                    MatrixCell {
                        probability,
                        impact,
                        score: scored.score,
                        band_id: policy.classify(scored.score).map(|b| b.id.clone()),
                    }
                })
                .collect()
        })
        .collect()
}

/// Count assessed risks per cell, in the same orientation as `make_matrix`
pub fn occupancy(policy: &RiskPolicy, risks: &[AssessedRisk]) -> Vec<Vec<usize>> {
    let scale = policy.scale();
    let size = scale.len();
    let mut grid = vec![vec![0usize; size]; size];
    for risk in risks {
        if !scale.contains(risk.probability) || !scale.contains(risk.impact) {
            log::debug!(
                "risk '{}' at ({}, {}) lies outside the matrix",
                risk.id,
                risk.probability,
                risk.impact
            );
            continue;
        }
        let row = (scale.max - risk.impact) as usize;
        let col = (risk.probability - scale.min) as usize;
        grid[row][col] += 1;
    }
    grid
}

fn axis_domain(axis: Axis) -> RangeInclusive<i32> {
    let n = Criterion::on_axis(axis).count() as i32;
    (CRITERION_SCALE.min * n)..=(CRITERION_SCALE.max * n)
}

/// X axis domain of the threat scatter (3..=21)
pub fn probability_axis() -> RangeInclusive<i32> {
    axis_domain(Axis::Probability)
}

/// Y axis domain of the threat scatter (4..=28)
pub fn impact_axis() -> RangeInclusive<i32> {
    axis_domain(Axis::Impact)
}

/// Position of one threat in the scatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: i32,
    pub y: i32,
    pub name: String,
}

/// Probability total on x, impact total on y
pub fn scatter_position(threat: &ThreatAssessment) -> ScatterPoint {
    let totals = threat.totals();
    ScatterPoint {
        x: totals.probability_total,
        y: totals.impact_total,
        name: threat.name.clone(),
    }
}

pub fn scatter(threats: &[ThreatAssessment]) -> Vec<ScatterPoint> {
    threats.iter().map(scatter_position).collect()
}
