//! Deployment-controller hand-off seam
//!
//! The deployment controller's Go-template manifests are not expressible
//! through typed client structs, so the rendered manifest is handed off
//! with `kubectl apply` and phases are read back with jsonpath queries.
//! The subprocess lives behind a trait so the driver can be tested
//! without spawning anything.

use async_trait::async_trait;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::Error;

/// Deployment-controller operations the driver depends on
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GitOpsClient: Send + Sync {
    /// Hand a rendered manifest file to the deployment controller
    async fn apply(&self, manifest: &Path) -> Result<(), Error>;

    /// Sync phase of the deployed application
    async fn sync_status(&self, name: &str, namespace: &str) -> Result<String, Error>;

    /// Health phase of the deployed application
    async fn health_status(&self, name: &str, namespace: &str) -> Result<String, Error>;
}

/// Adapter spawning the `kubectl` binary
pub struct Kubectl;

impl Kubectl {
    async fn run(&self, operation: &'static str, args: &[&str]) -> Result<String, Error> {
        debug!(operation, ?args, "running kubectl");
        let output: Output = Command::new("kubectl")
            .args(args)
            .output()
            .await
            .map_err(|e| Error::gitops(operation, e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(Error::gitops(operation, stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn query(
        &self,
        operation: &'static str,
        name: &str,
        namespace: &str,
        jsonpath: &str,
    ) -> Result<String, Error> {
        self.run(
            operation,
            &[
                "get",
                &format!("application/{name}"),
                "-n",
                namespace,
                "-o",
                &format!("jsonpath={jsonpath}"),
            ],
        )
        .await
    }
}

#[async_trait]
impl GitOpsClient for Kubectl {
    async fn apply(&self, manifest: &Path) -> Result<(), Error> {
        let path = manifest
            .to_str()
            .ok_or_else(|| Error::gitops("apply", "manifest path is not valid UTF-8"))?;
        self.run("apply", &["apply", "-f", path]).await?;
        Ok(())
    }

    async fn sync_status(&self, name: &str, namespace: &str) -> Result<String, Error> {
        self.query("sync-status", name, namespace, "{.status.sync.status}")
            .await
    }

    async fn health_status(&self, name: &str, namespace: &str) -> Result<String, Error> {
        self.query("health-status", name, namespace, "{.status.health.status}")
            .await
    }
}
