pub mod aws;
mod command;
pub mod environment;
pub mod error;
pub mod kube;
pub mod memory;
pub mod traits;

pub use aws::AwsCli;
pub use environment::CliEnvironment;
pub use error::{CloudError, Result};
pub use kube::Kubectl;
pub use memory::{Call, InMemoryEnvironment};
pub use traits::{
    CapabilityCheck, Environment, IdentityProvider, ObjectUploader, ProbeStatus, ResourceCreator,
    ResourceProbe, SecretStore,
};
