//! Per-step outcomes and the scenario report assembled from them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Maximum length of a recorded payload rendering.
const MAX_PAYLOAD_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
}

/// Outcome of one verified step. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub number: u32,
    /// What the step checks (its success message)
    pub description: String,
    pub status: StepStatus,
    /// Success message, or fail message plus the underlying error detail
    pub message: String,
    /// Debug rendering of the step's result, truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub elapsed_ms: u64,
}

impl StepOutcome {
    pub(crate) fn passed(
        number: u32,
        message: &str,
        payload: Option<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            number,
            description: message.to_string(),
            status: StepStatus::Passed,
            message: message.to_string(),
            payload: payload.map(truncate_payload),
            elapsed_ms,
        }
    }

    pub(crate) fn failed(
        number: u32,
        description: &str,
        message: String,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            number,
            description: description.to_string(),
            status: StepStatus::Failed,
            message,
            payload: None,
            elapsed_ms,
        }
    }

    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == StepStatus::Passed
    }
}

fn truncate_payload(payload: String) -> String {
    if payload.len() <= MAX_PAYLOAD_LEN {
        return payload;
    }
    let mut cut = MAX_PAYLOAD_LEN;
    while !payload.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...[truncated]", payload.get(..cut).unwrap_or_default())
}

/// Aggregate verdict of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Ordered, append-only log of step outcomes for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    scenario: String,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    steps: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<String>,
    status: ScenarioStatus,
}

impl ScenarioReport {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
            skipped: None,
            status: ScenarioStatus::Passed,
        }
    }

    pub(crate) fn record(&mut self, outcome: StepOutcome) {
        if !outcome.is_passed() {
            self.status = ScenarioStatus::Failed;
        }
        self.steps.push(outcome);
    }

    pub(crate) fn mark_skipped(&mut self, reason: String) {
        if self.status != ScenarioStatus::Failed {
            self.status = ScenarioStatus::Skipped;
        }
        self.skipped = Some(reason);
    }

    pub(crate) fn close(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Outcomes in execution order
    #[must_use]
    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    #[must_use]
    pub fn status(&self) -> ScenarioStatus {
        self.status
    }

    /// True iff every recorded step passed and the scenario was not skipped.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.skipped.as_deref()
    }

    #[must_use]
    pub fn first_failure(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| !s.is_passed())
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Export the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures from `serde_json`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = match self.status {
            ScenarioStatus::Passed => "PASSED",
            ScenarioStatus::Failed => "FAILED",
            ScenarioStatus::Skipped => "SKIPPED",
        };
        writeln!(f, "{}: {}", self.scenario, verdict)?;
        for step in &self.steps {
            let mark = if step.is_passed() { "ok" } else { "FAIL" };
            writeln!(f, "  {}. [{}] {}", step.number, mark, step.message)?;
        }
        if let Some(reason) = &self.skipped {
            writeln!(f, "  skipped: {reason}")?;
        }
        Ok(())
    }
}
