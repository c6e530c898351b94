use cloud::Environment;
use provision_core::{Handle, ProvisionConfig, ResourceKind, ValidationReport};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::credentials::{CredentialSource, EnvCredentials};
use crate::prerequisites::{SystemPath, ToolLocator};

/// Collaborators and accumulated state for one run.
///
/// The configuration and collaborators are fixed at construction; steps can
/// only add handles and the validation report.
pub struct RunContext {
    config: Arc<ProvisionConfig>,
    env: Arc<dyn Environment>,
    credentials: Arc<dyn CredentialSource>,
    tools: Arc<dyn ToolLocator>,
    handles: BTreeMap<ResourceKind, Handle>,
    validation: Option<ValidationReport>,
}

impl RunContext {
    pub fn new(config: Arc<ProvisionConfig>, env: Arc<dyn Environment>) -> Self {
        Self {
            config,
            env,
            credentials: Arc::new(EnvCredentials),
            tools: Arc::new(SystemPath),
            handles: BTreeMap::new(),
            validation: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolLocator>) -> Self {
        self.tools = tools;
        self
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    pub fn credentials(&self) -> &dyn CredentialSource {
        self.credentials.as_ref()
    }

    pub fn tools(&self) -> &dyn ToolLocator {
        self.tools.as_ref()
    }

    pub fn record_handle(&mut self, kind: ResourceKind, handle: Handle) {
        self.handles.insert(kind, handle);
    }

    pub fn handle(&self, kind: ResourceKind) -> Option<&Handle> {
        self.handles.get(&kind)
    }

    pub fn handles(&self) -> &BTreeMap<ResourceKind, Handle> {
        &self.handles
    }

    pub fn set_validation(&mut self, report: ValidationReport) {
        self.validation = Some(report);
    }

    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    pub(crate) fn take_validation(&mut self) -> Option<ValidationReport> {
        self.validation.take()
    }
}
