//! Simulated environment with call recording and failure injection.
//!
//! Backs `--simulate` runs and the orchestrator's tests. Creation is
//! idempotency-checked: creating a resource that already exists is an error,
//! so a duplicate create shows up as a failed step instead of passing silently.

use async_trait::async_trait;
use provision_core::config::{ACCESS_KEY_FIELD, SECRET_KEY_FIELD};
use provision_core::{Handle, ResourceKind, ResourceSpec};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CloudError, Result};
use crate::traits::{
    split_secret_identifier, CapabilityCheck, IdentityProvider, ObjectUploader, ProbeStatus,
    ResourceCreator, ResourceProbe, SecretStore,
};

/// One recorded call against the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Probe(ResourceKind, String),
    Create(ResourceKind, String),
    Check(ResourceKind, String),
    UpsertSecret { namespace: String, name: String },
    Upload { bucket: String, key: String },
    CallerAccount,
}

#[derive(Debug, Default)]
struct Failures {
    probe: BTreeSet<ResourceKind>,
    create: BTreeSet<ResourceKind>,
    check: BTreeSet<ResourceKind>,
    uploads: bool,
}

#[derive(Debug, Default)]
struct State {
    account: String,
    resources: BTreeMap<ResourceKind, BTreeSet<String>>,
    secrets: BTreeMap<(String, String), BTreeMap<String, String>>,
    objects: BTreeMap<(String, String), u64>,
    calls: Vec<Call>,
    failures: Failures,
}

impl State {
    fn contains(&self, kind: ResourceKind, identifier: &str) -> bool {
        if kind == ResourceKind::Secret {
            return split_secret_identifier(identifier)
                .map(|(ns, name)| {
                    self.secrets
                        .contains_key(&(ns.to_string(), name.to_string()))
                })
                .unwrap_or(false);
        }
        self.resources
            .get(&kind)
            .is_some_and(|ids| ids.contains(identifier))
    }

    fn insert(&mut self, kind: ResourceKind, identifier: &str) {
        self.resources
            .entry(kind)
            .or_default()
            .insert(identifier.to_string());
    }

    fn any_cluster(&self) -> bool {
        self.resources
            .get(&ResourceKind::ClusterConnection)
            .is_some_and(|ids| !ids.is_empty())
    }
}

pub struct InMemoryEnvironment {
    state: Mutex<State>,
}

impl InMemoryEnvironment {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State {
                account: account.into(),
                ..Default::default()
            }),
        }
    }

    pub fn with_resource(mut self, kind: ResourceKind, identifier: &str) -> Self {
        self.state.get_mut().insert(kind, identifier);
        self
    }

    pub fn with_secret(mut self, namespace: &str, name: &str, data: BTreeMap<String, String>) -> Self {
        self.state
            .get_mut()
            .secrets
            .insert((namespace.to_string(), name.to_string()), data);
        self
    }

    pub fn fail_probe(mut self, kind: ResourceKind) -> Self {
        self.state.get_mut().failures.probe.insert(kind);
        self
    }

    pub fn fail_create(mut self, kind: ResourceKind) -> Self {
        self.state.get_mut().failures.create.insert(kind);
        self
    }

    pub fn fail_capability(mut self, kind: ResourceKind) -> Self {
        self.state.get_mut().failures.check.insert(kind);
        self
    }

    pub fn fail_uploads(mut self) -> Self {
        self.state.get_mut().failures.uploads = true;
        self
    }

    /// Simulates an out-of-band deletion.
    pub async fn remove(&self, kind: ResourceKind, identifier: &str) -> bool {
        let mut state = self.state.lock().await;
        if kind == ResourceKind::Secret {
            return match split_secret_identifier(identifier) {
                Ok((ns, name)) => state
                    .secrets
                    .remove(&(ns.to_string(), name.to_string()))
                    .is_some(),
                Err(_) => false,
            };
        }
        state
            .resources
            .get_mut(&kind)
            .is_some_and(|ids| ids.remove(identifier))
    }

    pub async fn exists(&self, kind: ResourceKind, identifier: &str) -> bool {
        self.state.lock().await.contains(kind, identifier)
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn probe_count(&self, kind: ResourceKind) -> usize {
        self.count(|c| matches!(c, Call::Probe(k, _) if *k == kind))
            .await
    }

    pub async fn create_count(&self, kind: ResourceKind) -> usize {
        self.count(|c| matches!(c, Call::Create(k, _) if *k == kind))
            .await
    }

    async fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().await.calls.iter().filter(|&c| pred(c)).count()
    }

    pub async fn secret(&self, namespace: &str, name: &str) -> Option<BTreeMap<String, String>> {
        self.state
            .lock()
            .await
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub async fn secret_count(&self) -> usize {
        self.state.lock().await.secrets.len()
    }

    /// Uploaded `(bucket, key)` pairs.
    pub async fn objects(&self) -> Vec<(String, String)> {
        self.state.lock().await.objects.keys().cloned().collect()
    }
}

#[async_trait]
impl ResourceProbe for InMemoryEnvironment {
    async fn probe(&self, kind: ResourceKind, identifier: &str) -> Result<ProbeStatus> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Probe(kind, identifier.to_string()));
        if state.failures.probe.contains(&kind) {
            return Err(CloudError::AccessDenied(format!(
                "simulated probe failure for {} {}",
                kind, identifier
            )));
        }
        Ok(if state.contains(kind, identifier) {
            ProbeStatus::Exists
        } else {
            ProbeStatus::Absent
        })
    }
}

#[async_trait]
impl ResourceCreator for InMemoryEnvironment {
    async fn create(&self, spec: &ResourceSpec) -> Result<Handle> {
        let kind = spec.kind();
        let id = spec.identifier();
        let mut state = self.state.lock().await;
        state.calls.push(Call::Create(kind, id.to_string()));

        if state.failures.create.contains(&kind) {
            return Err(CloudError::Rejected(format!(
                "simulated create failure for {} {}",
                kind, id
            )));
        }
        if kind == ResourceKind::Secret {
            return Err(CloudError::Rejected(
                "secrets are written through SecretStore::upsert_secret".to_string(),
            ));
        }
        if state.contains(kind, id) {
            return Err(CloudError::Rejected(format!("{} {} already exists", kind, id)));
        }

        state.insert(kind, id);
        debug!(kind = %kind, identifier = %id, "Simulated resource created");

        let handle = match kind {
            ResourceKind::ObjectStore => format!("s3://{}", id),
            ResourceKind::ExecutionRole => format!("arn:aws:iam::{}:role/{}", state.account, id),
            ResourceKind::RegistryGroup => format!("model-package-group/{}", id),
            ResourceKind::ClusterConnection => format!("simulated:cluster/{}", id),
            ResourceKind::Secret => id.to_string(),
        };
        Ok(Handle::new(handle))
    }
}

#[async_trait]
impl CapabilityCheck for InMemoryEnvironment {
    async fn check_capability(&self, kind: ResourceKind, identifier: &str) -> Result<String> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::Check(kind, identifier.to_string()));
        if state.failures.check.contains(&kind) {
            return Err(CloudError::CommandFailed {
                command: format!("check {}", kind),
                message: "simulated capability failure".to_string(),
            });
        }
        if !state.contains(kind, identifier) {
            return Err(CloudError::NotFound(identifier.to_string()));
        }
        if kind == ResourceKind::Secret {
            let (namespace, name) = split_secret_identifier(identifier)?;
            let data = state
                .secrets
                .get(&(namespace.to_string(), name.to_string()))
                .ok_or_else(|| CloudError::NotFound(identifier.to_string()))?;
            let populated = [ACCESS_KEY_FIELD, SECRET_KEY_FIELD]
                .iter()
                .filter(|field| data.get(**field).is_some_and(|v| !v.is_empty()))
                .count();
            if populated < 2 {
                return Err(CloudError::Rejected(format!(
                    "secret {} has {} populated fields",
                    identifier, populated
                )));
            }
            return Ok(format!("{} fields present", populated));
        }
        Ok(format!("{} reachable", kind.label()))
    }
}

#[async_trait]
impl SecretStore for InMemoryEnvironment {
    async fn upsert_secret(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::UpsertSecret {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        if !state.any_cluster() {
            return Err(CloudError::NotFound("no cluster connection".to_string()));
        }
        state
            .secrets
            .insert((namespace.to_string(), name.to_string()), data.clone());
        Ok(())
    }
}

#[async_trait]
impl ObjectUploader for InMemoryEnvironment {
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let size = tokio::fs::metadata(path).await?.len();
        let mut state = self.state.lock().await;
        state.calls.push(Call::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        if state.failures.uploads {
            return Err(CloudError::CommandFailed {
                command: format!("upload {}", key),
                message: "simulated upload failure".to_string(),
            });
        }
        if !state.contains(ResourceKind::ObjectStore, bucket) {
            return Err(CloudError::NotFound(format!("bucket {}", bucket)));
        }
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), size);
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryEnvironment {
    async fn caller_account(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        state.calls.push(Call::CallerAccount);
        Ok(state.account.clone())
    }
}
