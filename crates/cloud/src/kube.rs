//! Thin wrapper over `kubectl`.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::command;
use crate::error::{CloudError, Result};

const PROGRAM: &str = "kubectl";

#[derive(Debug, Clone, Default)]
pub struct Kubectl;

impl Kubectl {
    pub fn new() -> Self {
        Self
    }

    fn args(context: Option<&str>, args: &[&str]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(ctx) = context {
            full.push("--context".to_string());
            full.push(ctx.to_string());
        }
        full.extend(args.iter().map(|a| a.to_string()));
        full
    }

    pub async fn contexts(&self) -> Result<Vec<String>> {
        let out = command::run(
            PROGRAM,
            &Self::args(None, &["config", "get-contexts", "-o", "name"]),
            None,
        )
        .await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn cluster_info(&self, context: Option<&str>) -> Result<String> {
        command::run(PROGRAM, &Self::args(context, &["cluster-info"]), None).await
    }

    /// Returns the secret's `data` map, or `None` when it does not exist.
    pub async fn get_secret(
        &self,
        context: Option<&str>,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>> {
        let result = command::run(
            PROGRAM,
            &Self::args(
                context,
                &["get", "secret", name, "-n", namespace, "-o", "json"],
            ),
            None,
        )
        .await;

        match result {
            Ok(out) => {
                let secret: Value = serde_json::from_str(&out)?;
                let data = secret
                    .get("data")
                    .and_then(Value::as_object)
                    .map(|m| {
                        m.iter()
                            .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(Some(data))
            }
            Err(CloudError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn apply_secret(
        &self,
        context: Option<&str>,
        namespace: &str,
        name: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<()> {
        let manifest = secret_manifest(namespace, name, data);
        debug!(namespace = %namespace, name = %name, keys = data.len(), "Applying secret");
        command::run(
            PROGRAM,
            &Self::args(context, &["apply", "-f", "-"]),
            Some(manifest.as_bytes()),
        )
        .await?;
        Ok(())
    }
}

/// True when a kubeconfig context points at the named cluster.
pub fn is_cluster_context(context: &str, cluster: &str) -> bool {
    context == cluster || context.ends_with(&format!(":cluster/{}", cluster))
}

/// Opaque secret manifest; values travel on stdin, never in argv.
fn secret_manifest(namespace: &str, name: &str, data: &BTreeMap<String, String>) -> String {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "type": "Opaque",
        "metadata": { "name": name, "namespace": namespace },
        "stringData": data,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_args() {
        assert_eq!(
            Kubectl::args(Some("ctx"), &["cluster-info"]),
            vec!["--context", "ctx", "cluster-info"]
        );
        assert_eq!(Kubectl::args(None, &["cluster-info"]), vec!["cluster-info"]);
    }

    #[test]
    fn test_is_cluster_context() {
        assert!(is_cluster_context(
            "arn:aws:eks:ap-south-1:123456789012:cluster/mlops-churn-cluster",
            "mlops-churn-cluster"
        ));
        assert!(is_cluster_context("mlops-churn-cluster", "mlops-churn-cluster"));
        assert!(!is_cluster_context(
            "arn:aws:eks:ap-south-1:123456789012:cluster/other",
            "mlops-churn-cluster"
        ));
        assert!(!is_cluster_context("kind-mlops-churn-cluster", "mlops-churn-cluster"));
    }

    #[test]
    fn test_secret_manifest() {
        let mut data = BTreeMap::new();
        data.insert("AWS_ACCESS_KEY_ID".to_string(), "AKIA".to_string());
        let manifest: Value =
            serde_json::from_str(&secret_manifest("default", "aws-credentials", &data)).unwrap();

        assert_eq!(manifest["kind"], "Secret");
        assert_eq!(manifest["metadata"]["namespace"], "default");
        assert_eq!(manifest["metadata"]["name"], "aws-credentials");
        assert_eq!(manifest["stringData"]["AWS_ACCESS_KEY_ID"], "AKIA");
    }
}
