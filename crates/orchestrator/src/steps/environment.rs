use async_trait::async_trait;
use provision_core::StepName;
use tracing::info;

use crate::core::{RunContext, Step, StepSuccess};
use crate::error::{ProvisionError, Result};

/// Resolves the caller's account and checks it against the configuration, so
/// nothing gets created in the wrong account.
pub struct EnvironmentStep;

#[async_trait]
impl Step for EnvironmentStep {
    fn name(&self) -> StepName {
        StepName::Environment
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let actual = ctx.env().caller_account().await?;
        let config = ctx.config();
        if actual != config.account_id {
            return Err(ProvisionError::AccountMismatch {
                expected: config.account_id.clone(),
                actual,
            });
        }
        info!(account = %actual, region = %config.region, "Environment resolved");
        Ok(StepSuccess::succeeded(format!(
            "account {} in {}",
            actual, config.region
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud::InMemoryEnvironment;
    use provision_core::ProvisionConfig;
    use std::sync::Arc;

    fn context(caller: &str) -> RunContext {
        RunContext::new(
            Arc::new(ProvisionConfig::default().with_account_id("123456789012")),
            Arc::new(InMemoryEnvironment::new(caller)),
        )
    }

    #[tokio::test]
    async fn test_matching_account() {
        let ok = EnvironmentStep
            .run(&mut context("123456789012"))
            .await
            .unwrap();
        assert_eq!(ok.detail.as_deref(), Some("account 123456789012 in ap-south-1"));
    }

    #[tokio::test]
    async fn test_account_mismatch() {
        let err = EnvironmentStep
            .run(&mut context("999999999999"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AccountMismatch { .. }));
        assert!(err.to_string().contains("999999999999"));
    }
}
