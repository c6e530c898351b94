use cloud::CloudError;
use provision_core::ResourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Could not determine whether {kind} '{identifier}' exists: {source}")]
    Probe {
        kind: ResourceKind,
        identifier: String,
        #[source]
        source: CloudError,
    },

    #[error("Creating {kind} '{identifier}' failed: {source}")]
    Create {
        kind: ResourceKind,
        identifier: String,
        #[source]
        source: CloudError,
    },

    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Cluster connection failed: {0}")]
    Connection(String),

    #[error("Missing prerequisites: {}", .0.join(", "))]
    MissingPrerequisites(Vec<String>),

    #[error("Caller account {actual} does not match configured account {expected}")]
    AccountMismatch { expected: String, actual: String },

    #[error("Data setup failed: {0}")]
    DataSetup(String),

    #[error("Validation found {inaccessible} of {total} resources inaccessible")]
    ValidationFailed { inaccessible: usize, total: usize },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Environment error: {0}")]
    Cloud(#[from] CloudError),
}

impl ProvisionError {
    pub fn probe(kind: ResourceKind, identifier: impl Into<String>, source: CloudError) -> Self {
        Self::Probe {
            kind,
            identifier: identifier.into(),
            source,
        }
    }

    pub fn create(kind: ResourceKind, identifier: impl Into<String>, source: CloudError) -> Self {
        Self::Create {
            kind,
            identifier: identifier.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProvisionError::MissingPrerequisites(vec!["aws".into(), "kubectl".into()]);
        assert_eq!(err.to_string(), "Missing prerequisites: aws, kubectl");

        let err = ProvisionError::probe(
            ResourceKind::ObjectStore,
            "bucket",
            CloudError::AccessDenied("403".into()),
        );
        assert!(err.to_string().contains("object_store 'bucket'"));
        assert!(err.to_string().contains("Access denied"));

        let err = ProvisionError::MissingCredentials("AWS_SECRET_ACCESS_KEY");
        assert!(err.to_string().contains("AWS_SECRET_ACCESS_KEY"));
    }
}
