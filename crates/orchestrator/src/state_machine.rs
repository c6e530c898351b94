use provision_core::{RunState, StepState};

use crate::error::{ProvisionError, Result};

pub struct StepStateMachine;

impl StepStateMachine {
    pub fn validate_transition(from: &StepState, to: &StepState) -> Result<()> {
        if Self::allowed_transitions(from).contains(to) {
            Ok(())
        } else {
            Err(ProvisionError::InvalidTransition {
                from: format!("step:{}", from.as_str()),
                to: format!("step:{}", to.as_str()),
            })
        }
    }

    fn allowed_transitions(from: &StepState) -> Vec<StepState> {
        match from {
            StepState::NotStarted => vec![StepState::Running, StepState::Skipped],
            StepState::Running => vec![StepState::Succeeded, StepState::Failed],
            StepState::Succeeded | StepState::Skipped | StepState::Failed => vec![],
        }
    }

    pub fn can_transition(from: &StepState, to: &StepState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}

pub struct RunStateMachine;

impl RunStateMachine {
    pub fn validate_transition(from: &RunState, to: &RunState) -> Result<()> {
        if Self::allowed_transitions(from).contains(to) {
            Ok(())
        } else {
            Err(ProvisionError::InvalidTransition {
                from: format!("run:{}", from.as_str()),
                to: format!("run:{}", to.as_str()),
            })
        }
    }

    fn allowed_transitions(from: &RunState) -> Vec<RunState> {
        match from {
            RunState::Pending => vec![RunState::Running],
            RunState::Running => vec![RunState::Done, RunState::Degraded, RunState::Aborted],
            RunState::Done | RunState::Degraded | RunState::Aborted => vec![],
        }
    }

    pub fn can_transition(from: &RunState, to: &RunState) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_step_transitions() {
        assert!(StepStateMachine::can_transition(
            &StepState::NotStarted,
            &StepState::Running
        ));
        assert!(StepStateMachine::can_transition(
            &StepState::NotStarted,
            &StepState::Skipped
        ));
        assert!(StepStateMachine::can_transition(
            &StepState::Running,
            &StepState::Failed
        ));
    }

    #[test]
    fn test_invalid_step_transitions() {
        assert!(!StepStateMachine::can_transition(
            &StepState::NotStarted,
            &StepState::Succeeded
        ));
        assert!(!StepStateMachine::can_transition(
            &StepState::Running,
            &StepState::Skipped
        ));
        assert!(!StepStateMachine::can_transition(
            &StepState::Failed,
            &StepState::Running
        ));
    }

    #[test]
    fn test_run_transitions() {
        assert!(RunStateMachine::can_transition(
            &RunState::Pending,
            &RunState::Running
        ));
        assert!(RunStateMachine::can_transition(
            &RunState::Running,
            &RunState::Aborted
        ));
        assert!(!RunStateMachine::can_transition(
            &RunState::Pending,
            &RunState::Done
        ));
        assert!(!RunStateMachine::can_transition(
            &RunState::Aborted,
            &RunState::Running
        ));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = RunStateMachine::validate_transition(&RunState::Done, &RunState::Running)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition from run:done to run:running"
        );
    }
}
