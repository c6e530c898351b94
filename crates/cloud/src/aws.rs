//! Thin wrapper over the `aws` command line.

use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

use crate::command;
use crate::error::{CloudError, Result};

const PROGRAM: &str = "aws";

#[derive(Debug, Clone)]
pub struct AwsCli {
    region: String,
    profile: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    account: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleEnvelope {
    role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Role {
    arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachedPolicies {
    #[serde(default)]
    attached_policies: Vec<AttachedPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttachedPolicy {
    policy_arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelPackageGroup {
    pub model_package_group_arn: String,
    #[serde(default)]
    pub model_package_group_status: Option<String>,
}

impl AwsCli {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub(crate) fn args(&self, args: &[&str]) -> Vec<String> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.extend(["--region".to_string(), self.region.clone()]);
        full.extend(["--output".to_string(), "json".to_string()]);
        if let Some(profile) = &self.profile {
            full.extend(["--profile".to_string(), profile.clone()]);
        }
        full
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        command::run(PROGRAM, &self.args(args), None).await
    }

    pub async fn caller_account(&self) -> Result<String> {
        let out = self.run(&["sts", "get-caller-identity"]).await?;
        let identity: CallerIdentity = serde_json::from_str(&out)?;
        Ok(identity.account)
    }

    pub async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.run(&["s3api", "head-bucket", "--bucket", bucket]).await?;
        Ok(())
    }

    pub async fn create_bucket(&self, bucket: &str, versioning: Option<&str>) -> Result<()> {
        let constraint = format!("LocationConstraint={}", self.region);
        let mut args = vec!["s3api", "create-bucket", "--bucket", bucket];
        // us-east-1 rejects an explicit location constraint
        if self.region != "us-east-1" {
            args.extend(["--create-bucket-configuration", constraint.as_str()]);
        }
        self.run(&args).await?;
        info!(bucket = %bucket, region = %self.region, "Created bucket");

        if let Some(status) = versioning {
            let config = format!("Status={}", status);
            self.run(&[
                "s3api",
                "put-bucket-versioning",
                "--bucket",
                bucket,
                "--versioning-configuration",
                &config,
            ])
            .await?;
            debug!(bucket = %bucket, status = %status, "Configured bucket versioning");
        }
        Ok(())
    }

    pub async fn list_objects(&self, bucket: &str) -> Result<()> {
        self.run(&[
            "s3api",
            "list-objects-v2",
            "--bucket",
            bucket,
            "--max-items",
            "1",
        ])
        .await?;
        Ok(())
    }

    pub async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let source = path
            .to_str()
            .ok_or_else(|| CloudError::InvalidIdentifier(path.display().to_string()))?;
        let target = format!("s3://{}/{}", bucket, key);
        self.run(&["s3", "cp", source, &target]).await?;
        Ok(())
    }

    pub async fn get_role(&self, role: &str) -> Result<String> {
        let out = self.run(&["iam", "get-role", "--role-name", role]).await?;
        let envelope: RoleEnvelope = serde_json::from_str(&out)?;
        Ok(envelope.role.arn)
    }

    pub async fn create_role(&self, role: &str, service_principal: &str) -> Result<String> {
        let trust = trust_policy(service_principal);
        let out = self
            .run(&[
                "iam",
                "create-role",
                "--role-name",
                role,
                "--assume-role-policy-document",
                &trust,
            ])
            .await?;
        let envelope: RoleEnvelope = serde_json::from_str(&out)?;
        info!(role = %role, arn = %envelope.role.arn, "Created IAM role");
        Ok(envelope.role.arn)
    }

    pub async fn attach_role_policy(&self, role: &str, policy_arn: &str) -> Result<()> {
        self.run(&[
            "iam",
            "attach-role-policy",
            "--role-name",
            role,
            "--policy-arn",
            policy_arn,
        ])
        .await?;
        debug!(role = %role, policy = %policy_arn, "Attached role policy");
        Ok(())
    }

    pub async fn attached_role_policies(&self, role: &str) -> Result<Vec<String>> {
        let out = self
            .run(&["iam", "list-attached-role-policies", "--role-name", role])
            .await?;
        let policies: AttachedPolicies = serde_json::from_str(&out)?;
        Ok(policies
            .attached_policies
            .into_iter()
            .map(|p| p.policy_arn)
            .collect())
    }

    pub async fn describe_model_package_group(&self, group: &str) -> Result<ModelPackageGroup> {
        let out = self
            .run(&[
                "sagemaker",
                "describe-model-package-group",
                "--model-package-group-name",
                group,
            ])
            .await?;
        Ok(serde_json::from_str(&out)?)
    }

    pub async fn create_model_package_group(&self, group: &str, description: &str) -> Result<String> {
        let out = self
            .run(&[
                "sagemaker",
                "create-model-package-group",
                "--model-package-group-name",
                group,
                "--model-package-group-description",
                description,
            ])
            .await?;
        let created: ModelPackageGroup = serde_json::from_str(&out)?;
        info!(group = %group, "Created model package group");
        Ok(created.model_package_group_arn)
    }

    /// Writes a kubeconfig entry for the cluster and returns the context name.
    pub async fn update_kubeconfig(&self, cluster: &str) -> Result<String> {
        let out = self
            .run(&["eks", "update-kubeconfig", "--name", cluster])
            .await?;
        Ok(parse_context_name(&out).unwrap_or_else(|| cluster.to_string()))
    }
}

fn trust_policy(service_principal: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": service_principal },
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}

/// Extracts the context from "Added new context <ctx> to <path>".
fn parse_context_name(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|token| token.starts_with("arn:aws:eks:"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_include_region_and_profile() {
        let cli = AwsCli::new("ap-south-1");
        assert_eq!(
            cli.args(&["s3api", "head-bucket"]),
            vec!["s3api", "head-bucket", "--region", "ap-south-1", "--output", "json"]
        );

        let cli = AwsCli::new("us-east-1").with_profile(Some("ml".to_string()));
        let args = cli.args(&["sts", "get-caller-identity"]);
        assert_eq!(&args[args.len() - 2..], ["--profile", "ml"]);
    }

    #[test]
    fn test_trust_policy() {
        let policy: serde_json::Value =
            serde_json::from_str(&trust_policy("sagemaker.amazonaws.com")).unwrap();
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            "sagemaker.amazonaws.com"
        );
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[test]
    fn test_parse_context_name() {
        let out = "Added new context arn:aws:eks:ap-south-1:123456789012:cluster/mlops to /root/.kube/config\n";
        assert_eq!(
            parse_context_name(out).as_deref(),
            Some("arn:aws:eks:ap-south-1:123456789012:cluster/mlops")
        );
        assert_eq!(parse_context_name("Updated context"), None);
    }

    #[test]
    fn test_parse_responses() {
        let identity: CallerIdentity = serde_json::from_str(
            r#"{"UserId":"AID","Account":"123456789012","Arn":"arn:aws:iam::123456789012:user/me"}"#,
        )
        .unwrap();
        assert_eq!(identity.account, "123456789012");

        let policies: AttachedPolicies = serde_json::from_str(
            r#"{"AttachedPolicies":[{"PolicyName":"S3","PolicyArn":"arn:aws:iam::aws:policy/AmazonS3FullAccess"}]}"#,
        )
        .unwrap();
        assert_eq!(policies.attached_policies.len(), 1);

        let group: ModelPackageGroup = serde_json::from_str(
            r#"{"ModelPackageGroupName":"G","ModelPackageGroupArn":"arn:g","ModelPackageGroupStatus":"Completed"}"#,
        )
        .unwrap();
        assert_eq!(group.model_package_group_status.as_deref(), Some("Completed"));
    }
}
