use async_trait::async_trait;
use provision_core::{Handle, ResourceKind, ResourceSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// Answer of an existence probe.
///
/// "Not found" from the environment is `Absent`; every other failure is an
/// `Err` from the probe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Exists,
    Absent,
}

impl ProbeStatus {
    pub fn exists(&self) -> bool {
        matches!(self, ProbeStatus::Exists)
    }
}

/// Read-only existence check.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn probe(&self, kind: ResourceKind, identifier: &str) -> Result<ProbeStatus>;
}

/// Provisions one resource. Callers must have just probed it as absent.
#[async_trait]
pub trait ResourceCreator: Send + Sync {
    async fn create(&self, spec: &ResourceSpec) -> Result<Handle>;
}

/// Exercises a resource beyond existence (list a bucket, query a cluster).
#[async_trait]
pub trait CapabilityCheck: Send + Sync {
    /// Returns a short description of what succeeded.
    async fn check_capability(&self, kind: ResourceKind, identifier: &str) -> Result<String>;
}

/// Namespaced secret storage in the target cluster.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Replace-or-create; re-running overwrites the previous value.
    async fn upsert_secret(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<()>;
}

#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<()>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Account id of the ambient credentials.
    async fn caller_account(&self) -> Result<String>;
}

/// Everything the orchestrator needs from the target environment.
pub trait Environment:
    ResourceProbe + ResourceCreator + CapabilityCheck + SecretStore + ObjectUploader + IdentityProvider
{
}

impl<T> Environment for T where
    T: ResourceProbe
        + ResourceCreator
        + CapabilityCheck
        + SecretStore
        + ObjectUploader
        + IdentityProvider
{
}

/// Splits a `namespace/name` secret identifier.
pub fn split_secret_identifier(identifier: &str) -> Result<(&str, &str)> {
    match identifier.split_once('/') {
        Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((ns, name))
        }
        _ => Err(crate::error::CloudError::InvalidIdentifier(format!(
            "expected namespace/name, got '{}'",
            identifier
        ))),
    }
}
