//! AppStack Custom Resource Definition
//!
//! An AppStack describes a complete application deployment: a managed
//! database, a shared filesystem and a GitOps-deployed application bundle.
//! The controller converges provider resources toward this spec and folds
//! observed state back into the status subresource.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{DatabaseSpec, GitOpsSpec, NetworkSpec, SharedFsSpec};
use crate::Error;

/// Specification for an AppStack
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "appstack.dev",
    version = "v1alpha1",
    kind = "AppStack",
    plural = "appstacks",
    shortname = "as",
    status = "AppStackStatus",
    namespaced = false,
    printcolumn = r#"{"name":"Database","type":"string","jsonPath":".status.database.phase"}"#,
    printcolumn = r#"{"name":"Sync","type":"string","jsonPath":".status.app.sync"}"#,
    printcolumn = r#"{"name":"Health","type":"string","jsonPath":".status.app.health"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AppStackSpec {
    /// Provider region resources are created in
    pub region: String,

    /// External hostname for the deployed application
    pub hostname: String,

    /// Keep provider-managed cloud resources when the record is deleted
    ///
    /// Maps to an orphan deletion policy on every materialized provider
    /// resource, overriding the default delete-on-delete behavior.
    #[serde(default)]
    pub retain_on_delete: bool,

    /// Name of the provisioning provider config referenced by provider
    /// resources
    pub provider_config_name: String,

    /// Encryption key reference applied to database and filesystem resources
    #[serde(default)]
    pub kms_key_id: String,

    /// Managed database specification
    pub database: DatabaseSpec,

    /// Network placement
    pub network: NetworkSpec,

    /// Shared filesystem specification
    pub shared_fs: SharedFsSpec,

    /// GitOps deployment specification
    pub gitops: GitOpsSpec,
}

impl AppStackSpec {
    /// Validate the spec
    ///
    /// Validation failures require a spec change; the controller does not
    /// requeue them.
    pub fn validate(&self, name: &str) -> Result<(), Error> {
        if self.region.is_empty() {
            return Err(Error::validation(name, "region cannot be empty"));
        }
        if self.database.engine.is_empty() {
            return Err(Error::validation(name, "database.engine cannot be empty"));
        }
        if self.database.engine_version.is_empty() {
            return Err(Error::validation(
                name,
                "database.engineVersion cannot be empty",
            ));
        }
        if self.database.allocated_storage <= 0 {
            return Err(Error::validation(
                name,
                "database.allocatedStorage must be positive",
            ));
        }
        if self.network.subnet_ids.is_empty() {
            return Err(Error::validation(name, "network.subnetIds cannot be empty"));
        }
        if self.shared_fs.volume_size <= 0 {
            return Err(Error::validation(
                name,
                "sharedFs.volumeSize must be positive",
            ));
        }
        Ok(())
    }
}

/// Observed database state
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    /// Provider lifecycle phase of the database instance
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phase: String,

    /// Endpoint address of the database instance
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    /// Phase of the one-shot schema-migration job
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub migration_job_status: String,

    /// Phase of the one-shot credential-reset job
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reset_credentials_job_status: String,
}

/// Observed shared filesystem state
///
/// Exactly one identifier is set, by whichever provisioning strategy ran.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedFilesystemStatus {
    /// Identifier of a newly provisioned shared filesystem
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub efs_id: String,

    /// Identifier of a block volume restored from a snapshot
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ebs_id: String,

    /// Volume handle resolved from a filesystem snapshot restore
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fsx_id: String,
}

/// Observed GitOps application state
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppHealthStatus {
    /// Sync phase reported by the deployment controller
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sync: String,

    /// Health phase reported by the deployment controller
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub health: String,
}

/// Status for an AppStack
///
/// Owned by the convergence driver and mutated only through the status
/// delta writer; materializers never read it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppStackStatus {
    /// Observed database state
    #[serde(default)]
    pub database: DatabaseStatus,

    /// Observed shared filesystem state
    #[serde(default)]
    pub shared_filesystem: SharedFilesystemStatus,

    /// Observed application state
    #[serde(default)]
    pub app: AppHealthStatus,
}

impl AppStack {
    /// The deterministic identity shared by this record's provider resources
    ///
    /// Materialized objects derive their names from `{name}-{uid}` so that
    /// re-materialization on a later invocation produces an identical object.
    pub fn resource_name(&self) -> String {
        let name = self.metadata.name.as_deref().unwrap_or_default();
        let uid = self.metadata.uid.as_deref().unwrap_or_default();
        format!("{name}-{uid}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::types::EfsParams;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn sample_spec() -> AppStackSpec {
        AppStackSpec {
            region: "ap-southeast-2".to_string(),
            hostname: "wiki.example.com".to_string(),
            provider_config_name: "aws-provider".to_string(),
            database: DatabaseSpec {
                engine: "postgres".to_string(),
                engine_version: "14.7".to_string(),
                instance_class: "db.t3.medium".to_string(),
                allocated_storage: 100,
                snapshot_id: None,
            },
            network: NetworkSpec {
                subnet_ids: vec!["subnet-1".to_string()],
                security_group_ids: vec!["sg-1".to_string()],
            },
            shared_fs: SharedFsSpec {
                volume_size: 50,
                efs: EfsParams {
                    storage_class_name: "efs-sc".to_string(),
                    csi_driver_name: "efs.csi.aws.com".to_string(),
                },
                ebs: None,
                fsx: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn valid_spec_passes_validation() {
        assert!(sample_spec().validate("stack").is_ok());
    }

    #[test]
    fn empty_engine_fails_validation() {
        let mut spec = sample_spec();
        spec.database.engine.clear();
        assert!(spec.validate("stack").is_err());
    }

    #[test]
    fn missing_subnets_fail_validation() {
        let mut spec = sample_spec();
        spec.network.subnet_ids.clear();
        assert!(spec.validate("stack").is_err());
    }

    #[test]
    fn resource_name_is_deterministic() {
        let stack = AppStack {
            metadata: ObjectMeta {
                name: Some("wiki".to_string()),
                uid: Some("uid-123".to_string()),
                ..Default::default()
            },
            spec: sample_spec(),
            status: None,
        };
        assert_eq!(stack.resource_name(), "wiki-uid-123");
        assert_eq!(stack.resource_name(), stack.resource_name());
    }
}
