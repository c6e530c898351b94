//! Post-provisioning validation.
//!
//! Every entry comes from a fresh probe plus a capability check against the
//! environment, never from what earlier steps reported.

use cloud::Environment;
use provision_core::{ResourceSpec, ValidationEntry, ValidationReport};
use tracing::{debug, warn};

pub struct Validator<'a> {
    env: &'a dyn Environment,
}

impl<'a> Validator<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        Self { env }
    }

    /// Check every spec; a failure only affects its own entry.
    pub async fn validate(&self, specs: &[ResourceSpec]) -> ValidationReport {
        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            entries.push(self.check(spec).await);
        }
        entries.into_iter().collect()
    }

    async fn check(&self, spec: &ResourceSpec) -> ValidationEntry {
        let kind = spec.kind();
        let id = spec.identifier();

        match self.env.probe(kind, id).await {
            Ok(status) if status.exists() => {}
            Ok(_) => {
                warn!(kind = %kind, identifier = %id, "Resource missing during validation");
                return ValidationEntry::inaccessible(kind, id, "not found");
            }
            Err(e) => {
                warn!(kind = %kind, identifier = %id, error = %e, "Validation probe failed");
                return ValidationEntry::inaccessible(kind, id, format!("probe failed: {}", e));
            }
        }

        match self.env.check_capability(kind, id).await {
            Ok(detail) => {
                debug!(kind = %kind, identifier = %id, "Resource accessible");
                ValidationEntry::accessible(kind, id, detail)
            }
            Err(e) => {
                warn!(kind = %kind, identifier = %id, error = %e, "Capability check failed");
                ValidationEntry::inaccessible(kind, id, format!("check failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud::InMemoryEnvironment;
    use provision_core::config::{ACCESS_KEY_FIELD, SECRET_KEY_FIELD};
    use provision_core::{ProvisionConfig, ResourceKind};
    use std::collections::BTreeMap;

    fn credential_fields(access_key: &str, secret_key: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (ACCESS_KEY_FIELD.to_string(), access_key.to_string()),
            (SECRET_KEY_FIELD.to_string(), secret_key.to_string()),
        ])
    }

    fn all_present(config: &ProvisionConfig) -> InMemoryEnvironment {
        let mut env = InMemoryEnvironment::new("123456789012");
        for kind in ResourceKind::ALL {
            if kind != ResourceKind::Secret {
                env = env.with_resource(kind, &config.identifier(kind));
            }
        }
        env.with_secret(
            &config.namespace,
            &config.secret_name,
            credential_fields("AKIATEST", "secret-test-value"),
        )
    }

    #[tokio::test]
    async fn test_all_accessible() {
        let config = ProvisionConfig::default();
        let env = all_present(&config);

        let report = Validator::new(&env).validate(&config.resource_specs()).await;

        assert_eq!(report.len(), ResourceKind::ALL.len());
        assert!(report.all_accessible());
    }

    #[tokio::test]
    async fn test_missing_resource_does_not_stop_pass() {
        let config = ProvisionConfig::default();
        let env = all_present(&config);
        env.remove(ResourceKind::ObjectStore, &config.bucket_name).await;

        let report = Validator::new(&env).validate(&config.resource_specs()).await;

        assert_eq!(report.len(), ResourceKind::ALL.len());
        let entry = report.entry(ResourceKind::ObjectStore).unwrap();
        assert!(!entry.accessible);
        assert_eq!(entry.detail, "not found");
        assert_eq!(report.inaccessible().count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_and_check_failures_are_isolated() {
        let config = ProvisionConfig::default();
        let env = all_present(&config)
            .fail_probe(ResourceKind::ExecutionRole)
            .fail_capability(ResourceKind::RegistryGroup);

        let report = Validator::new(&env).validate(&config.resource_specs()).await;

        let role = report.entry(ResourceKind::ExecutionRole).unwrap();
        assert!(role.detail.starts_with("probe failed"));
        let group = report.entry(ResourceKind::RegistryGroup).unwrap();
        assert!(group.detail.starts_with("check failed"));
        assert_eq!(report.accessible_count(), 3);
    }

    #[tokio::test]
    async fn test_secret_with_blank_fields_is_inaccessible() {
        let config = ProvisionConfig::default();
        let env = all_present(&config).with_secret(
            &config.namespace,
            &config.secret_name,
            credential_fields("AKIATEST", ""),
        );

        let report = Validator::new(&env).validate(&config.resource_specs()).await;

        let secret = report.entry(ResourceKind::Secret).unwrap();
        assert!(!secret.accessible);
        assert!(secret.detail.starts_with("check failed"));
        assert_eq!(report.inaccessible().count(), 1);
    }

    #[tokio::test]
    async fn test_validation_never_creates() {
        let config = ProvisionConfig::default();
        let env = InMemoryEnvironment::new("123456789012");

        let report = Validator::new(&env).validate(&config.resource_specs()).await;

        assert_eq!(report.accessible_count(), 0);
        for kind in ResourceKind::ALL {
            assert_eq!(env.create_count(kind).await, 0);
        }
    }
}
