//! Scenario reporting.
//!
//! Each step ends in exactly one of three states: passed, failed with a
//! diagnostic, or skipped because a dependency did not pass. The report is
//! serializable so CI can archive it next to the run logs.

use crate::result::CandadoResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome class of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step completed and all its assertions held
    Passed,
    /// Step aborted on a timeout or assertion failure
    Failed,
    /// Step not executed; a dependency failed or the scenario was skipped
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of one scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step name
    pub step: String,
    /// Outcome class
    pub status: StepStatus,
    /// Failure or skip diagnostic
    pub detail: Option<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl StepOutcome {
    /// A passing outcome
    #[must_use]
    pub fn passed(step: impl Into<String>, duration: Duration) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Passed,
            detail: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// A failing outcome with its diagnostic
    #[must_use]
    pub fn failed(step: impl Into<String>, detail: impl Into<String>, duration: Duration) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Failed,
            detail: Some(detail.into()),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// A skipped outcome with the reason
    #[must_use]
    pub fn skipped(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Skipped,
            detail: Some(reason.into()),
            duration_ms: 0,
        }
    }
}

/// Verdict over the whole scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioVerdict {
    /// Every step passed
    Passed,
    /// At least one step failed
    Failed,
    /// Nothing failed but the run did not complete (missing configuration)
    Skipped,
}

/// Collected outcomes of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub scenario: String,
    /// Per-step outcomes in execution order
    pub steps: Vec<StepOutcome>,
}

impl ScenarioReport {
    /// Create an empty report
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step outcome
    pub fn push(&mut self, outcome: StepOutcome) {
        self.steps.push(outcome);
    }

    /// Whether every step passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status == StepStatus::Passed)
    }

    /// Count steps with the given status
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// The failed steps, in order
    #[must_use]
    pub fn failures(&self) -> Vec<&StepOutcome> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .collect()
    }

    /// Overall verdict: failed beats skipped beats passed
    #[must_use]
    pub fn verdict(&self) -> ScenarioVerdict {
        if self.count(StepStatus::Failed) > 0 {
            ScenarioVerdict::Failed
        } else if self.count(StepStatus::Skipped) > 0 || self.steps.is_empty() {
            ScenarioVerdict::Skipped
        } else {
            ScenarioVerdict::Passed
        }
    }

    /// Serialize the report as pretty JSON
    pub fn to_json(&self) -> CandadoResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::result::CandadoError::session(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_skipped() {
        let report = ScenarioReport::new("lock-room");
        assert!(!report.all_passed());
        assert_eq!(report.verdict(), ScenarioVerdict::Skipped);
    }

    #[test]
    fn test_all_passed() {
        let mut report = ScenarioReport::new("lock-room");
        report.push(StepOutcome::passed("setup", Duration::from_millis(12)));
        report.push(StepOutcome::passed("lock-room", Duration::from_millis(34)));
        assert!(report.all_passed());
        assert_eq!(report.verdict(), ScenarioVerdict::Passed);
    }

    #[test]
    fn test_failure_beats_skip() {
        let mut report = ScenarioReport::new("lock-room");
        report.push(StepOutcome::passed("setup", Duration::ZERO));
        report.push(StepOutcome::failed(
            "lock-room",
            "lock indicator never reported locked",
            Duration::from_secs(5),
        ));
        report.push(StepOutcome::skipped(
            "unlock-room",
            "dependency failed: lock-room",
        ));
        assert_eq!(report.verdict(), ScenarioVerdict::Failed);
        assert_eq!(report.count(StepStatus::Skipped), 1);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].step, "lock-room");
    }

    #[test]
    fn test_skip_without_failure_is_skipped_verdict() {
        let mut report = ScenarioReport::new("lock-room");
        report.push(StepOutcome::skipped(
            "setup",
            "Missing configuration: CANDADO_MODERATOR_TOKEN",
        ));
        assert_eq!(report.verdict(), ScenarioVerdict::Skipped);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let mut report = ScenarioReport::new("lock-room");
        report.push(StepOutcome::passed("setup", Duration::from_millis(7)));
        let json = report.to_json().unwrap();
        let back: ScenarioReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scenario, "lock-room");
        assert_eq!(back.steps.len(), 1);
        assert_eq!(back.steps[0].status, StepStatus::Passed);
    }
}
