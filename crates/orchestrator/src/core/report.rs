use chrono::{DateTime, Utc};
use provision_core::{
    Handle, ResourceKind, RunState, StepName, StepOutcome, StepResult, StepState, ValidationReport,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use uuid::Uuid;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub results: Vec<StepResult>,
    pub step_states: BTreeMap<StepName, StepState>,
    pub handles: BTreeMap<ResourceKind, Handle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn result(&self, name: StepName) -> Option<&StepResult> {
        self.results.iter().find(|r| r.name() == name)
    }

    /// Steps that never ran after an abort stay `NotStarted`.
    pub fn step_state(&self, name: StepName) -> StepState {
        self.step_states.get(&name).copied().unwrap_or_default()
    }

    /// First failed result, if any.
    pub fn failure(&self) -> Option<&StepResult> {
        self.results
            .iter()
            .find(|r| r.outcome() == StepOutcome::Failed)
    }

    pub fn exit_code(&self) -> u8 {
        if self.state.is_success() {
            0
        } else {
            1
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Human-readable rendering for the terminal.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Run {} ({})", self.run_id, self.state);

        for result in &self.results {
            let _ = write!(
                out,
                "  {:<20} {:<15} {:>6}ms",
                result.name().as_str(),
                result.outcome().as_str(),
                result.duration_ms()
            );
            if let Some(detail) = result.detail() {
                let _ = write!(out, "  {}", detail);
            }
            out.push('\n');
        }

        if let Some(validation) = &self.validation {
            out.push_str("\nValidation: ");
            out.push_str(&validation.summary());
        }

        if !self.handles.is_empty() {
            out.push_str("\nResources:\n");
            for (kind, handle) in &self.handles {
                let _ = writeln!(out, "  {:<22} {}", kind.label(), handle);
            }
        }

        let _ = writeln!(
            out,
            "\nFinal state: {} after {}ms",
            self.state,
            self.duration_ms()
        );
        out
    }
}
