//! Static provisioning configuration.
//!
//! A [`ProvisionConfig`] is read once when the process starts (from
//! `provision.toml` or defaults) and then shared read-only with every
//! component of the run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{Handle, ResourceKind, ResourceSpec};
use crate::error::{CoreError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "provision.toml";

/// Parameter keys understood by resource creators.
pub mod keys {
    pub const REGION: &str = "region";
    pub const VERSIONING: &str = "versioning";
    pub const SERVICE_PRINCIPAL: &str = "service_principal";
    pub const POLICIES: &str = "policies";
    pub const DESCRIPTION: &str = "description";
    pub const NAMESPACE: &str = "namespace";
    pub const NAME: &str = "name";
    pub const FIELDS: &str = "fields";
}

pub const ACCESS_KEY_FIELD: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_KEY_FIELD: &str = "AWS_SECRET_ACCESS_KEY";

/// Local training data file and the object key it is uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    pub local: String,
    pub key: String,
}

impl DataFile {
    pub fn new(local: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub region: String,
    pub account_id: String,
    pub profile: Option<String>,
    pub bucket_name: String,
    pub cluster_name: String,
    pub role_name: String,
    pub role_service_principal: String,
    pub role_policies: Vec<String>,
    pub registry_group_name: String,
    pub registry_group_description: String,
    pub namespace: String,
    pub secret_name: String,
    pub data_dir: PathBuf,
    pub data_files: Vec<DataFile>,
    pub required_tools: Vec<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            region: "ap-south-1".to_string(),
            account_id: String::new(),
            profile: None,
            bucket_name: "mlops-churn-model-artifacts".to_string(),
            cluster_name: "mlops-churn-cluster".to_string(),
            role_name: "SageMakerChurnRole".to_string(),
            role_service_principal: "sagemaker.amazonaws.com".to_string(),
            role_policies: vec![
                "arn:aws:iam::aws:policy/AmazonSageMakerFullAccess".to_string(),
                "arn:aws:iam::aws:policy/AmazonS3FullAccess".to_string(),
            ],
            registry_group_name: "ChurnModelPackageGroup".to_string(),
            registry_group_description: "Churn prediction models".to_string(),
            namespace: "default".to_string(),
            secret_name: "aws-credentials".to_string(),
            data_dir: PathBuf::from("data"),
            data_files: vec![
                DataFile::new("preprocessed.csv", "preprocessed/preprocessed.csv"),
                DataFile::new("train.csv", "processed/train/train.csv"),
                DataFile::new("validation.csv", "processed/validation/validation.csv"),
            ],
            required_tools: vec![
                "aws".to_string(),
                "kubectl".to_string(),
                "docker".to_string(),
            ],
        }
    }
}

impl ProvisionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("region", &self.region),
            ("bucket_name", &self.bucket_name),
            ("cluster_name", &self.cluster_name),
            ("role_name", &self.role_name),
            ("registry_group_name", &self.registry_group_name),
            ("namespace", &self.namespace),
            ("secret_name", &self.secret_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidConfig(format!("{} must not be empty", field)));
            }
        }

        if self.account_id.len() != 12 || !self.account_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidConfig(format!(
                "account_id must be a 12-digit AWS account id, got '{}'",
                self.account_id
            )));
        }

        if self.required_tools.iter().any(|t| t.trim().is_empty()) {
            return Err(CoreError::InvalidConfig(
                "required_tools must not contain empty entries".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bucket_uri(&self) -> String {
        format!("s3://{}", self.bucket_name)
    }

    pub fn role_arn(&self) -> String {
        format!("arn:aws:iam::{}:role/{}", self.account_id, self.role_name)
    }

    pub fn secret_identifier(&self) -> String {
        format!("{}/{}", self.namespace, self.secret_name)
    }

    /// Handle reported for a resource that was found rather than created.
    pub fn handle_for(&self, kind: ResourceKind) -> Handle {
        let handle = match kind {
            ResourceKind::ObjectStore => self.bucket_uri(),
            ResourceKind::ExecutionRole => self.role_arn(),
            ResourceKind::RegistryGroup => format!(
                "arn:aws:sagemaker:{}:{}:model-package-group/{}",
                self.region,
                self.account_id,
                self.registry_group_name.to_lowercase()
            ),
            ResourceKind::ClusterConnection => format!(
                "arn:aws:eks:{}:{}:cluster/{}",
                self.region, self.account_id, self.cluster_name
            ),
            ResourceKind::Secret => self.secret_identifier(),
        };
        Handle::new(handle)
    }

    /// Identifier the provisioner uses for a resource kind.
    pub fn identifier(&self, kind: ResourceKind) -> String {
        match kind {
            ResourceKind::ObjectStore => self.bucket_name.clone(),
            ResourceKind::ExecutionRole => self.role_name.clone(),
            ResourceKind::RegistryGroup => self.registry_group_name.clone(),
            ResourceKind::ClusterConnection => self.cluster_name.clone(),
            ResourceKind::Secret => self.secret_identifier(),
        }
    }

    pub fn spec_for(&self, kind: ResourceKind) -> ResourceSpec {
        let spec = ResourceSpec::new(kind, self.identifier(kind));
        match kind {
            ResourceKind::ObjectStore => spec
                .with_param(keys::REGION, &self.region)
                .with_param(keys::VERSIONING, "Enabled"),
            ResourceKind::ExecutionRole => spec
                .with_param(keys::SERVICE_PRINCIPAL, &self.role_service_principal)
                .with_param(keys::POLICIES, self.role_policies.join(",")),
            ResourceKind::RegistryGroup => {
                spec.with_param(keys::DESCRIPTION, &self.registry_group_description)
            }
            ResourceKind::ClusterConnection => spec.with_param(keys::REGION, &self.region),
            ResourceKind::Secret => spec
                .with_param(keys::NAMESPACE, &self.namespace)
                .with_param(keys::NAME, &self.secret_name)
                .with_param(
                    keys::FIELDS,
                    format!("{},{}", ACCESS_KEY_FIELD, SECRET_KEY_FIELD),
                ),
        }
    }

    /// Specs for every tracked resource, in validation order.
    pub fn resource_specs(&self) -> Vec<ResourceSpec> {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| self.spec_for(kind))
            .collect()
    }
}
