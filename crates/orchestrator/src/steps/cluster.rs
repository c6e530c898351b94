use async_trait::async_trait;
use provision_core::{ResourceKind, StepName, StepOutcome};
use tracing::info;

use crate::core::{RunContext, Step, StepSuccess};
use crate::error::{ProvisionError, Result};
use crate::provisioner::ensure_resource;

/// Connects to the cluster if no context exists yet, then verifies the
/// connection answers.
pub struct ClusterConnectionStep;

#[async_trait]
impl Step for ClusterConnectionStep {
    fn name(&self) -> StepName {
        StepName::ClusterConnection
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let kind = ResourceKind::ClusterConnection;
        let spec = ctx.config().spec_for(kind);
        let ensured = ensure_resource(ctx.env(), &spec).await?;

        let verified = ctx
            .env()
            .check_capability(kind, spec.identifier())
            .await
            .map_err(|e| ProvisionError::Connection(e.to_string()))?;
        info!(cluster = %spec.identifier(), "{}", verified);

        let handle = match ensured.outcome {
            StepOutcome::Created => ensured.handle,
            _ => ctx.config().handle_for(kind),
        };
        let detail = format!("{} ({})", handle, verified);
        ctx.record_handle(kind, handle);

        Ok(StepSuccess {
            outcome: ensured.outcome,
            detail: Some(detail),
        })
    }
}
