use async_trait::async_trait;
use provision_core::{Handle, ResourceKind, StepName};

use crate::core::{RunContext, Step, StepSuccess};
use crate::credentials::CredentialBridge;
use crate::error::Result;

/// Publishes ambient credentials into the cluster secret.
pub struct CredentialBridgeStep;

#[async_trait]
impl Step for CredentialBridgeStep {
    fn name(&self) -> StepName {
        StepName::CredentialBridge
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let credentials = ctx.credentials().load()?;
        let config = ctx.config();
        let result = CredentialBridge::new(ctx.env(), &config.namespace, &config.secret_name)
            .bridge(&credentials)
            .await?;

        let identifier = format!("{}/{}", result.namespace, result.secret_name);
        let verb = if result.replaced { "replaced" } else { "created" };
        ctx.record_handle(ResourceKind::Secret, Handle::new(identifier.clone()));

        Ok(StepSuccess::succeeded(format!("{} secret {}", verb, identifier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AwsCredentials, CredentialSource};
    use crate::error::ProvisionError;
    use cloud::InMemoryEnvironment;
    use provision_core::ProvisionConfig;
    use std::sync::Arc;

    struct NoCredentials;

    impl CredentialSource for NoCredentials {
        fn load(&self) -> Result<AwsCredentials> {
            Err(ProvisionError::MissingCredentials("AWS_ACCESS_KEY_ID"))
        }
    }

    struct Fixed;

    impl CredentialSource for Fixed {
        fn load(&self) -> Result<AwsCredentials> {
            AwsCredentials::new("AKIA", "secret")
        }
    }

    fn env() -> Arc<InMemoryEnvironment> {
        Arc::new(
            InMemoryEnvironment::new("123456789012")
                .with_resource(ResourceKind::ClusterConnection, "mlops-churn-cluster"),
        )
    }

    #[tokio::test]
    async fn test_publishes_secret_twice_without_duplicates() {
        let env = env();
        let mut ctx = RunContext::new(Arc::new(ProvisionConfig::default()), env.clone())
            .with_credentials(Arc::new(Fixed));

        let first = CredentialBridgeStep.run(&mut ctx).await.unwrap();
        assert_eq!(
            first.detail.as_deref(),
            Some("created secret default/aws-credentials")
        );
        let second = CredentialBridgeStep.run(&mut ctx).await.unwrap();
        assert_eq!(
            second.detail.as_deref(),
            Some("replaced secret default/aws-credentials")
        );
        assert_eq!(env.secret_count().await, 1);
        assert_eq!(
            ctx.handle(ResourceKind::Secret).unwrap().as_str(),
            "default/aws-credentials"
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_write_nothing() {
        let env = env();
        let mut ctx = RunContext::new(Arc::new(ProvisionConfig::default()), env.clone())
            .with_credentials(Arc::new(NoCredentials));

        let err = CredentialBridgeStep.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MissingCredentials(_)));
        assert_eq!(env.secret_count().await, 0);
    }
}
