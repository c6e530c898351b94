use async_trait::async_trait;
use provision_core::StepName;

use crate::core::{RunContext, Step, StepSuccess};
use crate::error::{ProvisionError, Result};
use crate::validator::Validator;

/// Re-checks every tracked resource. Best-effort: an inaccessible resource
/// degrades the run instead of aborting it.
pub struct ValidationStep;

#[async_trait]
impl Step for ValidationStep {
    fn name(&self) -> StepName {
        StepName::Validation
    }

    fn best_effort(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let specs = ctx.config().resource_specs();
        let report = Validator::new(ctx.env()).validate(&specs).await;

        let accessible = report.accessible_count();
        let total = report.len();
        let all_accessible = report.all_accessible();
        ctx.set_validation(report);

        if !all_accessible {
            return Err(ProvisionError::ValidationFailed {
                inaccessible: total - accessible,
                total,
            });
        }
        Ok(StepSuccess::succeeded(format!(
            "{}/{} resources accessible",
            accessible, total
        )))
    }
}
