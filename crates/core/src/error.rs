use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unknown step: {0}")]
    UnknownStep(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::UnknownStep("deploy".to_string());
        assert!(error.to_string().contains("deploy"));

        let error = CoreError::InvalidConfig("region must not be empty".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: region must not be empty"
        );
    }
}
