//! The declared provisioning steps.

mod cluster;
mod credentials;
mod data_setup;
mod environment;
mod prerequisites;
mod resource;
mod validation;

pub use cluster::ClusterConnectionStep;
pub use credentials::CredentialBridgeStep;
pub use data_setup::DataSetupStep;
pub use environment::EnvironmentStep;
pub use prerequisites::PrerequisitesStep;
pub use resource::ResourceStep;
pub use validation::ValidationStep;

use crate::core::Step;

/// All nine steps in execution order.
pub fn standard_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(PrerequisitesStep),
        Box::new(EnvironmentStep),
        Box::new(ResourceStep::object_store()),
        Box::new(ResourceStep::execution_role()),
        Box::new(ResourceStep::registry_group()),
        Box::new(DataSetupStep),
        Box::new(ClusterConnectionStep),
        Box::new(CredentialBridgeStep),
        Box::new(ValidationStep),
    ]
}
