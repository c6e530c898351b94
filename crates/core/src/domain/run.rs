use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall state of a provisioning run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Pending,
    Running,
    /// Every executed step succeeded.
    Done,
    /// Only best-effort steps failed.
    Degraded,
    /// A required step failed and the remaining steps never ran.
    Aborted,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Degraded => "degraded",
            Self::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Degraded | Self::Aborted)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done | Self::Degraded)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunState::Pending.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Aborted.is_terminal());
        assert!(RunState::Degraded.is_success());
        assert!(!RunState::Aborted.is_success());
    }
}
