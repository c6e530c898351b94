use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CoreError, Result};

/// The declared provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    Prerequisites,
    Environment,
    ObjectStore,
    ExecutionRole,
    RegistryGroup,
    DataSetup,
    ClusterConnection,
    CredentialBridge,
    Validation,
}

impl StepName {
    pub const ORDER: [StepName; 9] = [
        Self::Prerequisites,
        Self::Environment,
        Self::ObjectStore,
        Self::ExecutionRole,
        Self::RegistryGroup,
        Self::DataSetup,
        Self::ClusterConnection,
        Self::CredentialBridge,
        Self::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prerequisites => "prerequisites",
            Self::Environment => "environment",
            Self::ObjectStore => "object-store",
            Self::ExecutionRole => "execution-role",
            Self::RegistryGroup => "registry-group",
            Self::DataSetup => "data-setup",
            Self::ClusterConnection => "cluster-connection",
            Self::CredentialBridge => "credential-bridge",
            Self::Validation => "validation",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::ORDER
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStep(s.to_string()))
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Created,
    AlreadyExists,
    Succeeded,
    Skipped,
    Failed,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already_exists",
            Self::Succeeded => "succeeded",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created | Self::AlreadyExists | Self::Succeeded)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single step within a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    #[default]
    NotStarted,
    Running,
    Succeeded,
    Skipped,
    Failed,
}

impl StepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Record of one step's execution. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    name: StepName,
    outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    duration_ms: u64,
}

impl StepResult {
    pub fn skipped(name: StepName) -> Self {
        Self {
            name,
            outcome: StepOutcome::Skipped,
            detail: None,
            duration_ms: 0,
        }
    }

    pub fn completed(
        name: StepName,
        outcome: StepOutcome,
        detail: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            name,
            outcome,
            detail,
            duration_ms,
        }
    }

    pub fn failed(name: StepName, detail: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name,
            outcome: StepOutcome::Failed,
            detail: Some(detail.into()),
            duration_ms,
        }
    }

    pub fn name(&self) -> StepName {
        self.name
    }

    pub fn outcome(&self) -> StepOutcome {
        self.outcome
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// Per-run switches, fixed before the first step starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    skip: BTreeSet<StepName>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, name: StepName) -> Self {
        self.skip.insert(name);
        self
    }

    pub fn skip_if(self, name: StepName, condition: bool) -> Self {
        if condition {
            self.skip(name)
        } else {
            self
        }
    }

    pub fn is_skipped(&self, name: StepName) -> bool {
        self.skip.contains(&name)
    }

    pub fn skipped(&self) -> impl Iterator<Item = StepName> + '_ {
        self.skip.iter().copied()
    }
}
