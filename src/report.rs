//! Report export: CSV and a versioned JSON envelope.
//!
//! Both encodings are pure functions of the outcome list. The CSV column
//! order is fixed; the JSON envelope adds a summary block and a
//! `format`/`version` tag.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::probe::{ProbeOutcome, Summary};

/// Value of the envelope's `format` field
pub const REPORT_FORMAT_TAG: &str = "ui-exerciser-report";

/// Current envelope version
pub const REPORT_VERSION: u32 = 1;

/// Column order of the CSV artifact
pub const CSV_COLUMNS: [&str; 6] = ["label", "location", "status", "action_category", "detail", "timestamp"];

const FILE_PREFIX: &str = "ui-exerciser-report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

/// JSON report body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub format: String,
    pub version: u32,
    /// RFC 3339, local offset
    pub generated_at: String,
    pub summary: Summary,
    pub outcomes: Vec<ProbeOutcome>,
}

impl ReportEnvelope {
    pub fn new(outcomes: &[ProbeOutcome]) -> Self {
        Self {
            format: REPORT_FORMAT_TAG.to_string(),
            version: REPORT_VERSION,
            generated_at: Local::now().to_rfc3339(),
            summary: Summary::from_outcomes(outcomes),
            outcomes: outcomes.to_vec(),
        }
    }
}

/// An exported report, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub format: ReportFormat,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Export with today's local date in the file name
pub fn export(outcomes: &[ProbeOutcome], format: ReportFormat) -> ReportResult<Artifact> {
    export_dated(outcomes, format, Local::now().date_naive())
}

pub fn export_dated(outcomes: &[ProbeOutcome], format: ReportFormat, date: NaiveDate) -> ReportResult<Artifact> {
    let content = match format {
        ReportFormat::Csv => to_csv(outcomes),
        ReportFormat::Json => to_json(outcomes)?,
    };
    Ok(Artifact {
        format,
        file_name: report_file_name(format, date),
        content,
    })
}

/// `ui-exerciser-report-YYYY-MM-DD.<ext>`
pub fn report_file_name(format: ReportFormat, date: NaiveDate) -> String {
    format!("{}-{}.{}", FILE_PREFIX, date.format("%Y-%m-%d"), format.extension())
}

/// Header row plus one row per outcome, every field quoted
pub fn to_csv(outcomes: &[ProbeOutcome]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_COLUMNS);
    for outcome in outcomes {
        push_row(
            &mut out,
            [
                outcome.label.as_str(),
                outcome.location.as_str(),
                outcome.status.as_str(),
                outcome.action_category.as_str(),
                outcome.detail.as_deref().unwrap_or(""),
                outcome.timestamp.as_str(),
            ],
        );
    }
    out
}

fn push_row<const N: usize>(out: &mut String, fields: [&str; N]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
    out.push('\n');
}

/// Pretty-printed [`ReportEnvelope`]
pub fn to_json(outcomes: &[ProbeOutcome]) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(&ReportEnvelope::new(outcomes))?)
}

/// Write the artifact into `dir` (created if missing) and return its path
pub fn write_artifact(artifact: &Artifact, dir: &Path) -> ReportResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.content)?;
    info!(path = %path.display(), "report written");
    Ok(path)
}
