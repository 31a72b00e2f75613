//! riskplan core library - risk scoring, threat analysis and measure coverage for security plans

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Every operation is a pure function of its inputs
// - No global mutable state, clocks, randomness, threads, or async
// - Ids are supplied by the caller, never generated here
// - Stored values are clamped, never rejected; only policy setup can fail
// - Identical input yields byte-for-byte identical output

pub mod authz;
pub mod band;
pub mod catalog;
pub mod config;
pub mod coverage;
pub mod document;
pub mod error;
pub mod export;
pub mod matrix;
pub mod measure;
pub mod policy;
pub mod project;
pub mod report;
pub mod risk;
pub mod scale;
pub mod scoring;
pub mod threat;

pub use catalog::{filter_risks, sort_risks, BandFilter, RiskFilter, SortKey};
pub use config::ResolvedConfig;
pub use coverage::{coverage, coverage_report, relevant_measures, Coverage, SelectedMeasures};
pub use error::ConfigError;
pub use policy::RiskPolicy;
pub use project::{load_project, Project};
pub use report::{render_json, MatrixReport, ThreatReport};
pub use risk::{assess_risks, AssessedRisk, Risk};
pub use threat::{Criterion, ThreatAssessment};

use anyhow::Result;
use coverage::legacy::rekey_applicable_risks;
use coverage::RiskCoverage;
use measure::{resolve_library, Measure, MeasureLibrary};

/// Assessed risks of a project, filtered and sorted for display
pub fn risk_catalog(
    project: &Project,
    policy: &RiskPolicy,
    filter: &RiskFilter,
    sort: SortKey,
) -> Vec<AssessedRisk> {
    let assessed = assess_risks(&project.risks, policy);
    sort_risks(&filter_risks(&assessed, filter), sort)
}

/// Effective measure library of a project, rekeyed to the project's risk ids
pub fn project_library(project: &Project, global: Option<&[Measure]>) -> Result<MeasureLibrary> {
    let measures = resolve_library(Some(project.measures.as_slice()), global)?;
    let rekeyed = rekey_applicable_risks(&measures, &project.risks);
    Ok(MeasureLibrary::from_measures(&rekeyed.measures))
}

/// P/D/R coverage of every project risk
pub fn project_coverage(project: &Project, global: Option<&[Measure]>) -> Result<Vec<RiskCoverage>> {
    let library = project_library(project, global)?;
    Ok(coverage_report(
        &project.risks,
        &project.selected_measures,
        &library,
    ))
}
