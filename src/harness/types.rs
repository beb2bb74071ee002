use serde::Serialize;
use thiserror::Error;

use crate::config::{self, TimingSettings};
use crate::probe::{ProbeOutcome, Selectors, Summary};

/// Outline applied to the element under test while it is probed
pub const DEFAULT_HIGHLIGHT_STYLE: &str = "outline: 3px solid #ff6b6b; outline-offset: 2px;";

/// Configuration for an exerciser run
#[derive(Debug, Clone)]
pub struct ExerciserConfig {
    /// Settle windows
    pub timings: TimingSettings,

    /// Discovery, classification and location selectors
    pub selectors: Selectors,

    /// Inline CSS appended to the element's own style during its probe
    pub highlight_style: String,
}

impl ExerciserConfig {
    /// Default selectors with the process-wide timings (see [`config::get`])
    pub fn from_env() -> Self {
        Self {
            timings: config::get().timings,
            ..Self::default()
        }
    }

    /// Default selectors with every settle window set to zero
    pub fn immediate() -> Self {
        Self {
            timings: TimingSettings::immediate(),
            ..Self::default()
        }
    }

    pub fn with_timings(mut self, timings: TimingSettings) -> Self {
        self.timings = timings;
        self
    }
}

impl Default for ExerciserConfig {
    fn default() -> Self {
        Self {
            timings: TimingSettings::defaults(),
            selectors: Selectors::default(),
            highlight_style: DEFAULT_HIGHLIGHT_STYLE.to_string(),
        }
    }
}

/// Live view of a run, published after every probe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub is_running: bool,

    /// Label of the element being probed right now
    pub current_label: Option<String>,

    /// Outcomes so far, in probe order
    pub outcomes: Vec<ProbeOutcome>,
}

impl RunSnapshot {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<ProbeOutcome>,
    pub summary: Summary,

    /// Number of elements discovery returned
    pub discovered: usize,

    /// The run stopped early because it was cancelled
    pub cancelled: bool,

    /// Discovery failed; no element was probed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Result type for run operations
pub type RunResult<T> = Result<T, RunError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// A second run was requested while one is in progress
    #[error("a run is already in progress")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_uses_the_process_wide_timings() {
        assert_eq!(ExerciserConfig::from_env().timings, config::get().timings);
        assert_eq!(ExerciserConfig::immediate().timings, TimingSettings::immediate());
    }
}
