//! Probe-then-create for a single resource.

use cloud::Environment;
use provision_core::{Handle, ResourceSpec, StepOutcome};
use tracing::info;

use crate::error::{ProvisionError, Result};

/// What `ensure_resource` did and the resulting handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured {
    pub outcome: StepOutcome,
    pub handle: Handle,
}

/// Make sure the resource described by `spec` exists.
///
/// Always probes first; creation runs at most once and only after the probe
/// answered `Absent`. An existing resource is left untouched and reported as
/// `AlreadyExists` with a handle built from its identifier.
pub async fn ensure_resource(env: &dyn Environment, spec: &ResourceSpec) -> Result<Ensured> {
    let kind = spec.kind();
    let id = spec.identifier();

    let status = env
        .probe(kind, id)
        .await
        .map_err(|e| ProvisionError::probe(kind, id, e))?;

    if status.exists() {
        info!(kind = %kind, identifier = %id, "Resource already exists");
        return Ok(Ensured {
            outcome: StepOutcome::AlreadyExists,
            handle: Handle::new(id),
        });
    }

    info!(kind = %kind, identifier = %id, "Resource absent, creating");
    let handle = env
        .create(spec)
        .await
        .map_err(|e| ProvisionError::create(kind, id, e))?;
    info!(kind = %kind, handle = %handle, "Resource created");

    Ok(Ensured {
        outcome: StepOutcome::Created,
        handle,
    })
}
