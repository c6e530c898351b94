use async_trait::async_trait;
use provision_core::{ResourceKind, StepName, StepOutcome};

use crate::core::{RunContext, Step, StepSuccess};
use crate::error::Result;
use crate::provisioner::ensure_resource;

/// Probe-then-create for one configured resource.
pub struct ResourceStep {
    name: StepName,
    kind: ResourceKind,
}

impl ResourceStep {
    pub fn new(name: StepName, kind: ResourceKind) -> Self {
        Self { name, kind }
    }

    pub fn object_store() -> Self {
        Self::new(StepName::ObjectStore, ResourceKind::ObjectStore)
    }

    pub fn execution_role() -> Self {
        Self::new(StepName::ExecutionRole, ResourceKind::ExecutionRole)
    }

    pub fn registry_group() -> Self {
        Self::new(StepName::RegistryGroup, ResourceKind::RegistryGroup)
    }
}

#[async_trait]
impl Step for ResourceStep {
    fn name(&self) -> StepName {
        self.name
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let spec = ctx.config().spec_for(self.kind);
        let ensured = ensure_resource(ctx.env(), &spec).await?;

        let handle = match ensured.outcome {
            StepOutcome::Created => ensured.handle,
            _ => ctx.config().handle_for(self.kind),
        };
        let detail = handle.to_string();
        ctx.record_handle(self.kind, handle);

        Ok(StepSuccess {
            outcome: ensured.outcome,
            detail: Some(detail),
        })
    }
}
