//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering (callers sort; renderers never reorder)
//! - Byte-for-byte identical output across runs

use crate::coverage::{CoverageStatus, RiskCoverage};
use crate::matrix::{make_matrix, occupancy, scatter_position, MatrixCell, ScatterPoint};
use crate::measure::Category;
use crate::policy::RiskPolicy;
use crate::risk::AssessedRisk;
use crate::threat::{ThreatAssessment, ThreatState, ThreatTotals};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Matrix grid together with per-cell risk counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixReport {
    pub cells: Vec<Vec<MatrixCell>>,
    pub occupancy: Vec<Vec<usize>>,
}

impl MatrixReport {
    pub fn new(policy: &RiskPolicy, risks: &[AssessedRisk]) -> Self {
        MatrixReport {
            cells: make_matrix(policy),
            occupancy: occupancy(policy, risks),
        }
    }
}

/// One threat with its derived values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatReport {
    pub id: String,
    pub name: String,
    pub source: String,
    pub state: ThreatState,
    pub totals: ThreatTotals,
    pub point: ScatterPoint,
}

impl ThreatReport {
    pub fn new(threat: &ThreatAssessment) -> Self {
        ThreatReport {
            id: threat.id.clone(),
            name: threat.name.clone(),
            source: threat.source.clone(),
            state: threat.state(),
            totals: threat.totals(),
            point: scatter_position(threat),
        }
    }
}

pub fn threat_reports(threats: &[ThreatAssessment]) -> Vec<ThreatReport> {
    threats.iter().map(ThreatReport::new).collect()
}

/// Render the risk list as text output
pub fn render_risks_text(risks: &[AssessedRisk]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<6} {:<10} {:<3} {:<3} {}\n",
        "SCORE", "BAND", "P", "I", "NAME"
    ));
    for risk in risks {
        output.push_str(&format!(
            "{:<6} {:<10} {:<3} {:<3} {}\n",
            risk.score,
            truncate_or_pad(risk.band_display(), 10),
            risk.probability,
            risk.impact,
            risk.display_name()
        ));
    }
    output
}

/// Render the matrix as text, one row per impact level (highest first)
pub fn render_matrix_text(report: &MatrixReport) -> String {
    let mut output = String::new();
    let Some(first_row) = report.cells.first() else {
        return output;
    };

    output.push_str(&format!("{:<4}", "I\\P"));
    for cell in first_row {
        output.push_str(&format!(" {:<12}", cell.probability));
    }
    output.push('\n');

    for (row, counts) in report.cells.iter().zip(&report.occupancy) {
        let impact = row.first().map(|c| c.impact).unwrap_or_default();
        output.push_str(&format!("{:<4}", impact));
        for (cell, count) in row.iter().zip(counts) {
            let band = cell.band_id.as_deref().unwrap_or("-");
            let label = if *count > 0 {
                format!("{}:{}({})", cell.score, band, count)
            } else {
                format!("{}:{}", cell.score, band)
            };
            output.push_str(&format!(" {}", truncate_or_pad(&label, 12)));
        }
        output.push('\n');
    }
    output
}

fn status_mark(status: Option<&CoverageStatus>) -> &'static str {
    match status {
        Some(CoverageStatus::Covered) => "yes",
        Some(CoverageStatus::Uncovered) => "no",
        Some(CoverageStatus::NoMeasures) | None => "n/a",
    }
}

/// Render P/D/R coverage per risk
pub fn render_coverage_text(rows: &[RiskCoverage]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<30} {:<4} {:<4} {:<4}\n",
        "RISK", "P", "D", "R"
    ));
    for row in rows {
        let name = if row.risk_name.is_empty() {
            &row.risk_id
        } else {
            &row.risk_name
        };
        output.push_str(&format!(
            "{} {:<4} {:<4} {:<4}\n",
            truncate_or_pad(name, 30),
            status_mark(row.status.get(&Category::Prevention)),
            status_mark(row.status.get(&Category::Detection)),
            status_mark(row.status.get(&Category::Reaction)),
        ));
    }
    output
}

/// Render threat totals
pub fn render_threats_text(reports: &[ThreatReport]) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:<6} {:<6} {:<9} {:<16} {}\n",
        "PROB", "IMPACT", "STATE", "SOURCE", "THREAT"
    ));
    for report in reports {
        let state = match report.state {
            ThreatState::Scored => "scored",
            ThreatState::Unscored => "unscored",
        };
        output.push_str(&format!(
            "{:<6} {:<6} {:<9} {} {}\n",
            report.totals.probability_total,
            report.totals.impact_total,
            state,
            truncate_or_pad(&report.source, 16),
            report.name
        ));
    }
    output
}

/// Render any report as pretty JSON
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize report")
}

/// Truncate or pad string to a fixed width in characters
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
