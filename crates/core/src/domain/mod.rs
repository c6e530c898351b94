mod resource;
mod run;
mod step;
mod validation;

pub use resource::{Handle, ResourceKind, ResourceSpec};
pub use run::RunState;
pub use step::{RunOptions, StepName, StepOutcome, StepResult, StepState};
pub use validation::{ValidationEntry, ValidationReport};
