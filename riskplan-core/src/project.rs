//! Project documents
//!
//! A project is the stored JSON record the derived views are computed from.
//! Unknown fields are ignored; stored documents carry UI state this crate
//! does not interpret.

use crate::coverage::SelectedMeasures;
use crate::document::Block;
use crate::measure::Measure;
use crate::risk::Risk;
use crate::threat::ThreatAssessment;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Text shown for basic-info fields that are missing or empty
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Stored as either a number or free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_size: Option<Value>,
    #[serde(default)]
    pub involved_teams: BTreeMap<String, bool>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default, rename = "threatAnalysis")]
    pub threats: Vec<ThreatAssessment>,
    #[serde(default)]
    pub selected_measures: SelectedMeasures,
    /// Personal measure library; empty falls back to the global or built-in one
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_blocks: Vec<Block>,
}

impl Project {
    /// Team names flagged as involved, in name order
    pub fn involved_teams(&self) -> Vec<&str> {
        self.involved_teams
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Title used in headings: official name, then working name
    pub fn title(&self) -> &str {
        match self.official_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.name,
        }
    }

    pub fn official_name_display(&self) -> &str {
        non_empty(self.official_name.as_deref())
    }

    pub fn organizer_display(&self) -> &str {
        non_empty(self.organizer.as_deref())
    }

    pub fn author_display(&self) -> &str {
        non_empty(self.author.as_deref())
    }

    pub fn audience_size_display(&self) -> String {
        match &self.audience_size {
            Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v != 0.0) => n.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            _ => NOT_AVAILABLE.to_string(),
        }
    }
}

fn non_empty(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// Read and parse a project file
pub fn load_project(path: &Path) -> Result<Project> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read project file: {}", path.display()))?;
    let project: Project = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse project file: {}", path.display()))?;
    log::debug!(
        "loaded project '{}' ({} risks, {} threats)",
        project.id,
        project.risks.len(),
        project.threats.len()
    );
    Ok(project)
}
