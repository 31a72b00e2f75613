//! CSV export of assessed risks

use crate::risk::AssessedRisk;
use anyhow::{Context, Result};
use std::io::Write;

pub const CSV_HEADER: [&str; 8] = [
    "id",
    "name",
    "description",
    "probability",
    "impact",
    "score",
    "bandId",
    "bandLabel",
];

fn flatten(field: &str) -> String {
    field.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Write assessed risks as CSV, one row per risk in the given order
pub fn write_risks_csv<W: Write>(writer: W, risks: &[AssessedRisk]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)
        .context("failed to write CSV header")?;

    for risk in risks {
        let probability = risk.probability.to_string();
        let impact = risk.impact.to_string();
        let score = risk.score.to_string();
        csv.write_record([
            flatten(&risk.id).as_str(),
            flatten(&risk.name).as_str(),
            flatten(risk.description.as_deref().unwrap_or("")).as_str(),
            probability.as_str(),
            impact.as_str(),
            score.as_str(),
            risk.band_id.as_deref().unwrap_or(""),
            flatten(risk.band_label.as_deref().unwrap_or("")).as_str(),
        ])
        .with_context(|| format!("failed to write CSV row for risk '{}'", risk.id))?;
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// Convenience wrapper returning the CSV as a string
pub fn risks_to_csv(risks: &[AssessedRisk]) -> Result<String> {
    let mut buf = Vec::new();
    write_risks_csv(&mut buf, risks)?;
    String::from_utf8(buf).context("CSV output is not valid UTF-8")
}
