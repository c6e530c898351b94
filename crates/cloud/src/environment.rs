use async_trait::async_trait;
use provision_core::config::keys;
use provision_core::{Handle, ResourceKind, ResourceSpec};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::aws::AwsCli;
use crate::error::{CloudError, Result};
use crate::kube::{is_cluster_context, Kubectl};
use crate::traits::{
    split_secret_identifier, CapabilityCheck, IdentityProvider, ObjectUploader, ProbeStatus,
    ResourceCreator, ResourceProbe, SecretStore,
};

/// Environment backed by the `aws` and `kubectl` command lines.
pub struct CliEnvironment {
    aws: AwsCli,
    kubectl: Kubectl,
    cluster_name: String,
}

impl CliEnvironment {
    pub fn new(aws: AwsCli, cluster_name: impl Into<String>) -> Self {
        Self {
            aws,
            kubectl: Kubectl::new(),
            cluster_name: cluster_name.into(),
        }
    }

    async fn find_context(&self, cluster: &str) -> Result<Option<String>> {
        let contexts = self.kubectl.contexts().await?;
        Ok(contexts
            .into_iter()
            .find(|ctx| is_cluster_context(ctx, cluster)))
    }

    /// Context of the managed cluster; secrets must land there, not in
    /// whatever context happens to be current.
    async fn cluster_context(&self) -> Result<String> {
        self.find_context(&self.cluster_name).await?.ok_or_else(|| {
            CloudError::NotFound(format!(
                "no kubeconfig context for cluster {}",
                self.cluster_name
            ))
        })
    }
}

/// Maps "not found" onto `Absent`, leaving every other failure an error.
fn to_probe_status(result: Result<()>) -> Result<ProbeStatus> {
    match result {
        Ok(()) => Ok(ProbeStatus::Exists),
        Err(CloudError::NotFound(_)) => Ok(ProbeStatus::Absent),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ResourceProbe for CliEnvironment {
    async fn probe(&self, kind: ResourceKind, identifier: &str) -> Result<ProbeStatus> {
        debug!(kind = %kind, identifier = %identifier, "Probing resource");
        match kind {
            ResourceKind::ObjectStore => to_probe_status(self.aws.head_bucket(identifier).await),
            ResourceKind::ExecutionRole => {
                to_probe_status(self.aws.get_role(identifier).await.map(|_| ()))
            }
            ResourceKind::RegistryGroup => to_probe_status(
                self.aws
                    .describe_model_package_group(identifier)
                    .await
                    .map(|_| ()),
            ),
            ResourceKind::ClusterConnection => Ok(match self.find_context(identifier).await? {
                Some(_) => ProbeStatus::Exists,
                None => ProbeStatus::Absent,
            }),
            ResourceKind::Secret => {
                let (namespace, name) = split_secret_identifier(identifier)?;
                let context = match self.find_context(&self.cluster_name).await? {
                    Some(ctx) => ctx,
                    // No connection means the secret cannot exist yet
                    None => return Ok(ProbeStatus::Absent),
                };
                let secret = self
                    .kubectl
                    .get_secret(Some(&context), namespace, name)
                    .await?;
                Ok(if secret.is_some() {
                    ProbeStatus::Exists
                } else {
                    ProbeStatus::Absent
                })
            }
        }
    }
}

#[async_trait]
impl ResourceCreator for CliEnvironment {
    async fn create(&self, spec: &ResourceSpec) -> Result<Handle> {
        let id = spec.identifier();
        info!(kind = %spec.kind(), identifier = %id, "Creating resource");
        match spec.kind() {
            ResourceKind::ObjectStore => {
                self.aws
                    .create_bucket(id, spec.param(keys::VERSIONING))
                    .await?;
                Ok(Handle::new(format!("s3://{}", id)))
            }
            ResourceKind::ExecutionRole => {
                let principal = spec
                    .param(keys::SERVICE_PRINCIPAL)
                    .unwrap_or("sagemaker.amazonaws.com");
                let arn = self.aws.create_role(id, principal).await?;
                for policy in spec.param_list(keys::POLICIES) {
                    self.aws.attach_role_policy(id, policy).await?;
                }
                Ok(Handle::new(arn))
            }
            ResourceKind::RegistryGroup => {
                let description = spec.param(keys::DESCRIPTION).unwrap_or_default();
                let arn = self
                    .aws
                    .create_model_package_group(id, description)
                    .await?;
                Ok(Handle::new(arn))
            }
            ResourceKind::ClusterConnection => {
                let context = self.aws.update_kubeconfig(id).await?;
                Ok(Handle::new(context))
            }
            ResourceKind::Secret => Err(CloudError::Rejected(
                "secrets are written through SecretStore::upsert_secret".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CapabilityCheck for CliEnvironment {
    async fn check_capability(&self, kind: ResourceKind, identifier: &str) -> Result<String> {
        match kind {
            ResourceKind::ObjectStore => {
                self.aws.list_objects(identifier).await?;
                Ok("object listing succeeded".to_string())
            }
            ResourceKind::ExecutionRole => {
                let policies = self.aws.attached_role_policies(identifier).await?;
                if policies.is_empty() {
                    return Err(CloudError::Rejected(format!(
                        "role {} has no attached policies",
                        identifier
                    )));
                }
                Ok(format!("{} policies attached", policies.len()))
            }
            ResourceKind::RegistryGroup => {
                let group = self.aws.describe_model_package_group(identifier).await?;
                match group.model_package_group_status.as_deref() {
                    Some("Completed") => Ok("group status is Completed".to_string()),
                    status => Err(CloudError::Rejected(format!(
                        "group status is {}",
                        status.unwrap_or("unknown")
                    ))),
                }
            }
            ResourceKind::ClusterConnection => {
                let context = self.find_context(identifier).await?.ok_or_else(|| {
                    CloudError::NotFound(format!("no kubeconfig context for {}", identifier))
                })?;
                self.kubectl.cluster_info(Some(&context)).await?;
                Ok(format!("cluster-info succeeded via {}", context))
            }
            ResourceKind::Secret => {
                let (namespace, name) = split_secret_identifier(identifier)?;
                let context = self.cluster_context().await?;
                let data = self
                    .kubectl
                    .get_secret(Some(&context), namespace, name)
                    .await?
                    .ok_or_else(|| CloudError::NotFound(identifier.to_string()))?;
                let populated = data.values().filter(|v| !v.is_empty()).count();
                if populated < 2 {
                    return Err(CloudError::Rejected(format!(
                        "secret {} has {} populated fields",
                        identifier, populated
                    )));
                }
                Ok(format!("{} fields present", populated))
            }
        }
    }
}

#[async_trait]
impl SecretStore for CliEnvironment {
    async fn upsert_secret(
        &self,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<()> {
        let context = self.cluster_context().await?;
        self.kubectl
            .apply_secret(Some(&context), namespace, name, data)
            .await
    }
}

#[async_trait]
impl ObjectUploader for CliEnvironment {
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        self.aws.upload(bucket, key, path).await
    }
}

#[async_trait]
impl IdentityProvider for CliEnvironment {
    async fn caller_account(&self) -> Result<String> {
        self.aws.caller_account().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_probe_status() {
        assert_eq!(to_probe_status(Ok(())).unwrap(), ProbeStatus::Exists);
        assert_eq!(
            to_probe_status(Err(CloudError::NotFound("x".to_string()))).unwrap(),
            ProbeStatus::Absent
        );
        assert!(matches!(
            to_probe_status(Err(CloudError::AccessDenied("x".to_string()))),
            Err(CloudError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_secret_create_goes_through_secret_store() {
        let env = CliEnvironment::new(AwsCli::new("ap-south-1"), "mlops");
        let spec = ResourceSpec::new(ResourceKind::Secret, "default/aws-credentials");
        let err = env.create(&spec).await.unwrap_err();
        assert!(matches!(err, CloudError::Rejected(_)));
    }
}
