//! Publishing ambient cloud credentials into the cluster secret store.

use cloud::Environment;
use provision_core::config::{ACCESS_KEY_FIELD, SECRET_KEY_FIELD};
use provision_core::ResourceKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::error::{ProvisionError, Result};

/// An access key pair. Values never reach `Debug` output.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl AwsCredentials {
    /// Both fields must be non-empty.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        if access_key_id.trim().is_empty() {
            return Err(ProvisionError::MissingCredentials(ACCESS_KEY_FIELD));
        }
        if secret_access_key.trim().is_empty() {
            return Err(ProvisionError::MissingCredentials(SECRET_KEY_FIELD));
        }
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }

    fn secret_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        data.insert(ACCESS_KEY_FIELD.to_string(), self.access_key_id.clone());
        data.insert(SECRET_KEY_FIELD.to_string(), self.secret_access_key.clone());
        data
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Where credentials come from.
pub trait CredentialSource: Send + Sync {
    fn load(&self) -> Result<AwsCredentials>;
}

/// Reads `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` from the process
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn load(&self) -> Result<AwsCredentials> {
        let read = |field: &'static str| {
            std::env::var(field)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ProvisionError::MissingCredentials(field))
        };
        AwsCredentials::new(read(ACCESS_KEY_FIELD)?, read(SECRET_KEY_FIELD)?)
    }
}

/// Fixed credentials, for simulated runs and tests.
#[derive(Debug, Clone)]
pub struct StaticCredentials(AwsCredentials);

impl StaticCredentials {
    pub fn new(credentials: AwsCredentials) -> Self {
        Self(credentials)
    }
}

impl CredentialSource for StaticCredentials {
    fn load(&self) -> Result<AwsCredentials> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeResult {
    pub namespace: String,
    pub secret_name: String,
    /// Whether an existing secret was overwritten.
    pub replaced: bool,
}

pub struct CredentialBridge<'a> {
    env: &'a dyn Environment,
    namespace: &'a str,
    secret_name: &'a str,
}

impl<'a> CredentialBridge<'a> {
    pub fn new(env: &'a dyn Environment, namespace: &'a str, secret_name: &'a str) -> Self {
        Self {
            env,
            namespace,
            secret_name,
        }
    }

    /// Write `credentials` into the secret, replacing any previous value.
    pub async fn bridge(&self, credentials: &AwsCredentials) -> Result<BridgeResult> {
        let identifier = format!("{}/{}", self.namespace, self.secret_name);
        let replaced = self
            .env
            .probe(ResourceKind::Secret, &identifier)
            .await
            .map_err(|e| ProvisionError::probe(ResourceKind::Secret, &identifier, e))?
            .exists();

        self.env
            .upsert_secret(self.namespace, self.secret_name, &credentials.secret_data())
            .await
            .map_err(|e| ProvisionError::create(ResourceKind::Secret, &identifier, e))?;

        info!(
            namespace = %self.namespace,
            secret = %self.secret_name,
            replaced,
            "Credentials published to cluster"
        );

        Ok(BridgeResult {
            namespace: self.namespace.to_string(),
            secret_name: self.secret_name.to_string(),
            replaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud::InMemoryEnvironment;

    fn creds() -> AwsCredentials {
        AwsCredentials::new("AKIAEXAMPLE", "very-secret-value").unwrap()
    }

    #[test]
    fn test_empty_fields_rejected() {
        let err = AwsCredentials::new("", "secret").unwrap_err();
        assert!(matches!(err, ProvisionError::MissingCredentials(ACCESS_KEY_FIELD)));
        let err = AwsCredentials::new("AKIA", " ").unwrap_err();
        assert!(matches!(err, ProvisionError::MissingCredentials(SECRET_KEY_FIELD)));
    }

    #[test]
    fn test_debug_redacts_values() {
        let debug = format!("{:?}", creds());
        assert!(!debug.contains("AKIAEXAMPLE"));
        assert!(!debug.contains("very-secret-value"));
        assert!(debug.contains("redacted"));

        let debug = format!("{:?}", StaticCredentials::new(creds()));
        assert!(!debug.contains("very-secret-value"));
    }

    #[tokio::test]
    async fn test_bridge_creates_then_replaces() {
        let env = InMemoryEnvironment::new("123456789012")
            .with_resource(ResourceKind::ClusterConnection, "cluster");
        let bridge = CredentialBridge::new(&env, "default", "aws-credentials");

        let first = bridge.bridge(&creds()).await.unwrap();
        assert!(!first.replaced);
        let second = bridge.bridge(&creds()).await.unwrap();
        assert!(second.replaced);

        assert_eq!(env.secret_count().await, 1);
        let stored = env.secret("default", "aws-credentials").await.unwrap();
        assert_eq!(stored[ACCESS_KEY_FIELD], "AKIAEXAMPLE");
        assert_eq!(stored[SECRET_KEY_FIELD], "very-secret-value");
    }

    #[tokio::test]
    async fn test_bridge_without_cluster_fails() {
        let env = InMemoryEnvironment::new("123456789012");
        let bridge = CredentialBridge::new(&env, "default", "aws-credentials");

        let err = bridge.bridge(&creds()).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Create { .. }));
        assert!(!err.to_string().contains("very-secret-value"));
    }
}
