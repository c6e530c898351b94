use async_trait::async_trait;
use provision_core::StepName;

use crate::core::{RunContext, Step, StepSuccess};
use crate::error::{ProvisionError, Result};
use crate::prerequisites::missing_tools;

/// Fails when any required CLI tool is missing from `PATH`.
pub struct PrerequisitesStep;

#[async_trait]
impl Step for PrerequisitesStep {
    fn name(&self) -> StepName {
        StepName::Prerequisites
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let required = &ctx.config().required_tools;
        let missing = missing_tools(ctx.tools(), required);
        if !missing.is_empty() {
            return Err(ProvisionError::MissingPrerequisites(missing));
        }
        Ok(StepSuccess::succeeded(format!(
            "found {}",
            required.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prerequisites::{AssumeAvailable, ToolLocator};
    use cloud::InMemoryEnvironment;
    use provision_core::{ProvisionConfig, StepOutcome};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct NothingInstalled;

    impl ToolLocator for NothingInstalled {
        fn locate(&self, _tool: &str) -> Option<PathBuf> {
            None
        }
    }

    fn context(tools: Arc<dyn ToolLocator>) -> RunContext {
        RunContext::new(
            Arc::new(ProvisionConfig::default()),
            Arc::new(InMemoryEnvironment::new("123456789012")),
        )
        .with_tools(tools)
    }

    #[tokio::test]
    async fn test_all_tools_present() {
        let mut ctx = context(Arc::new(AssumeAvailable));
        let ok = PrerequisitesStep.run(&mut ctx).await.unwrap();
        assert_eq!(ok.outcome, StepOutcome::Succeeded);
        assert_eq!(ok.detail.as_deref(), Some("found aws, kubectl, docker"));
    }

    #[tokio::test]
    async fn test_missing_tools_listed() {
        let mut ctx = context(Arc::new(NothingInstalled));
        let err = PrerequisitesStep.run(&mut ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing prerequisites: aws, kubectl, docker"
        );
    }
}
