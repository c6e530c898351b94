//! Step trait and related types for the provisioning sequence.
//!
//! Each unit of the sequence (prerequisite check, resource provisioning,
//! credential bridging, validation) implements [`Step`]. The sequencer owns
//! ordering, skipping and fail-fast handling; a step only does its own work
//! and reports how it went.

use async_trait::async_trait;
use provision_core::{StepName, StepOutcome};

use super::context::RunContext;
use crate::error::Result;

/// Successful result of a step body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSuccess {
    pub outcome: StepOutcome,
    pub detail: Option<String>,
}

impl StepSuccess {
    pub fn created(detail: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::Created,
            detail: Some(detail.into()),
        }
    }

    pub fn already_exists(detail: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::AlreadyExists,
            detail: Some(detail.into()),
        }
    }

    pub fn succeeded(detail: impl Into<String>) -> Self {
        Self {
            outcome: StepOutcome::Succeeded,
            detail: Some(detail.into()),
        }
    }
}

/// Core trait that every provisioning step implements.
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable name, used for ordering reports and skip flags.
    fn name(&self) -> StepName;

    /// A best-effort step's failure is recorded but does not abort the run.
    fn best_effort(&self) -> bool {
        false
    }

    /// Execute the step body.
    ///
    /// Returning `Err` marks the step `Failed` with the error's message as
    /// detail.
    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_success_constructors() {
        assert_eq!(StepSuccess::created("x").outcome, StepOutcome::Created);
        assert_eq!(
            StepSuccess::already_exists("x").outcome,
            StepOutcome::AlreadyExists
        );
        let ok = StepSuccess::succeeded("all tools found");
        assert_eq!(ok.outcome, StepOutcome::Succeeded);
        assert_eq!(ok.detail.as_deref(), Some("all tools found"));
    }
}
