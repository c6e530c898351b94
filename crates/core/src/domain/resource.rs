use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Classes of infrastructure the provisioner manages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    ObjectStore,
    ExecutionRole,
    RegistryGroup,
    ClusterConnection,
    Secret,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        Self::ObjectStore,
        Self::ExecutionRole,
        Self::RegistryGroup,
        Self::ClusterConnection,
        Self::Secret,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectStore => "object_store",
            Self::ExecutionRole => "execution_role",
            Self::RegistryGroup => "registry_group",
            Self::ClusterConnection => "cluster_connection",
            Self::Secret => "secret",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ObjectStore => "S3 bucket",
            Self::ExecutionRole => "IAM execution role",
            Self::RegistryGroup => "Model package group",
            Self::ClusterConnection => "EKS cluster connection",
            Self::Secret => "Cluster secret",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one resource to provision.
///
/// Built once from configuration at run start; there is no mutable access
/// to the identifier or the creation parameters afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpec {
    kind: ResourceKind,
    identifier: String,
    params: BTreeMap<String, String>,
}

impl ResourceSpec {
    pub fn new(kind: ResourceKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Comma-separated parameter split into its non-empty items.
    pub fn param_list(&self, key: &str) -> Vec<&str> {
        self.param(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Opaque identifier returned by a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ResourceKind::ClusterConnection).unwrap();
        assert_eq!(json, "\"cluster_connection\"");
        assert_eq!(ResourceKind::ObjectStore.to_string(), "object_store");
    }

    #[test]
    fn test_spec_params() {
        let spec = ResourceSpec::new(ResourceKind::ExecutionRole, "SageMakerChurnRole")
            .with_param("service_principal", "sagemaker.amazonaws.com")
            .with_param("policies", "arn:a, arn:b,,");

        assert_eq!(spec.kind(), ResourceKind::ExecutionRole);
        assert_eq!(spec.identifier(), "SageMakerChurnRole");
        assert_eq!(spec.param("service_principal"), Some("sagemaker.amazonaws.com"));
        assert_eq!(spec.param("missing"), None);
        assert_eq!(spec.param_list("policies"), vec!["arn:a", "arn:b"]);
        assert!(spec.param_list("missing").is_empty());
    }

    #[test]
    fn test_handle_display() {
        let handle = Handle::new("s3://bucket");
        assert_eq!(handle.to_string(), "s3://bucket");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "\"s3://bucket\"");
    }
}
