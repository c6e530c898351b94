pub mod core;
pub mod credentials;
pub mod error;
pub mod prerequisites;
pub mod provisioner;
pub mod state_machine;
pub mod steps;
pub mod validator;

pub use crate::core::{RunContext, RunReport, Sequencer, Step, StepSuccess};
pub use credentials::{
    AwsCredentials, BridgeResult, CredentialBridge, CredentialSource, EnvCredentials,
    StaticCredentials,
};
pub use error::{ProvisionError, Result};
pub use prerequisites::{missing_tools, AssumeAvailable, SystemPath, ToolLocator};
pub use provisioner::{ensure_resource, Ensured};
pub use state_machine::{RunStateMachine, StepStateMachine};
pub use validator::Validator;
