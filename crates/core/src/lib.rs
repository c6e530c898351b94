pub mod config;
pub mod domain;
pub mod error;

pub use config::{DataFile, ProvisionConfig};
pub use domain::*;
pub use error::{CoreError, Result};
