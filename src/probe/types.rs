//! Types for probe outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::describe::ActionCategory;

/// Classification of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Warning,
    Error,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Success => "success",
            ProbeStatus::Warning => "warning",
            ProbeStatus::Error => "error",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural identity of the probed element, for the JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSummary {
    pub tag: String,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Durable record of one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Best-effort human readable name of the element
    pub label: String,

    /// Navigation path plus the nearest named ancestor
    pub location: String,

    pub status: ProbeStatus,

    /// What changed, or what went wrong
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    pub action_category: ActionCategory,

    /// Local wall-clock time when the probe finished
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementSummary>,
}

/// Tally of outcomes by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub success: usize,
    pub warning: usize,
    pub error: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[ProbeOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, outcome| {
            acc.total += 1;
            match outcome.status {
                ProbeStatus::Success => acc.success += 1,
                ProbeStatus::Warning => acc.warning += 1,
                ProbeStatus::Error => acc.error += 1,
            }
            acc
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tested: {} success, {} warning, {} error",
            self.total, self.success, self.warning, self.error
        )
    }
}
