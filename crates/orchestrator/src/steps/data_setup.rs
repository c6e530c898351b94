use async_trait::async_trait;
use provision_core::{ResourceKind, StepName};
use tracing::{info, warn};

use crate::core::{RunContext, Step, StepSuccess};
use crate::error::{ProvisionError, Result};

/// Uploads the configured training data files into the object store.
///
/// A missing local file, or one with no rows past its header, is skipped
/// with a warning. A single failed
/// upload is logged and counted; only a missing bucket fails the step.
pub struct DataSetupStep;

#[derive(Debug, Default, PartialEq, Eq)]
struct UploadTally {
    uploaded: usize,
    missing: usize,
    empty: usize,
    failed: usize,
}

impl UploadTally {
    fn detail(&self, bucket: &str) -> String {
        let mut detail = format!("uploaded {} file(s) to s3://{}", self.uploaded, bucket);
        let extras = [
            (self.missing, "missing"),
            (self.empty, "empty"),
            (self.failed, "failed"),
        ];
        for (count, label) in extras {
            if count > 0 {
                detail.push_str(&format!(", {} {}", count, label));
            }
        }
        detail
    }
}

/// Non-blank lines after the header line.
fn data_rows(contents: &[u8]) -> usize {
    contents
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .count()
        .saturating_sub(1)
}

#[async_trait]
impl Step for DataSetupStep {
    fn name(&self) -> StepName {
        StepName::DataSetup
    }

    async fn run(&self, ctx: &mut RunContext) -> Result<StepSuccess> {
        let config = ctx.config();
        let env = ctx.env();
        let bucket = config.bucket_name.as_str();

        let status = env
            .probe(ResourceKind::ObjectStore, bucket)
            .await
            .map_err(|e| ProvisionError::probe(ResourceKind::ObjectStore, bucket, e))?;
        if !status.exists() {
            return Err(ProvisionError::DataSetup(format!(
                "bucket {} does not exist",
                bucket
            )));
        }

        let mut tally = UploadTally::default();
        for file in &config.data_files {
            let path = config.data_dir.join(&file.local);

            let contents = match tokio::fs::read(&path).await {
                Ok(contents) => contents,
                Err(_) => {
                    warn!(path = %path.display(), "Data file not found, skipping");
                    tally.missing += 1;
                    continue;
                }
            };
            if data_rows(&contents) == 0 {
                warn!(path = %path.display(), "Data file has no rows, skipping");
                tally.empty += 1;
                continue;
            }

            info!(path = %path.display(), key = %file.key, bytes = contents.len(), "Uploading data file");
            match env.upload(bucket, &file.key, &path).await {
                Ok(()) => tally.uploaded += 1,
                Err(e) => {
                    warn!(path = %path.display(), key = %file.key, error = %e, "Upload failed");
                    tally.failed += 1;
                }
            }
        }

        Ok(StepSuccess::succeeded(tally.detail(bucket)))
    }
}
