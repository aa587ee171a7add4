//! Resource materializers
//!
//! Pure builders that turn an [`AppStack`](crate::crd::AppStack) record into
//! fully-specified dependent-resource objects. No I/O happens here: every
//! builder is deterministic in (record identity, kind, optional index), so
//! repeated materialization produces identical objects and creation stays
//! idempotent. Owner references point at the parent record so deletion
//! cascades; `retainOnDelete` maps to an orphan deletion policy on provider
//! resources.

mod database;
mod filesystem;
mod migration;
mod nfs;
mod secrets;
mod volumes;

pub use database::{db_parameter_group, db_subnet_group, rds_instance};
pub use filesystem::{ebs_volume, efs_filesystem, mount_target, mount_target_name};
pub use migration::{
    changelog_config_map, migration_job, reset_credentials_job, reset_service_account,
    CHANGELOG_KEY,
};
pub use nfs::{nfs_server_name, nfs_server_service, nfs_server_stateful_set};
pub use secrets::{
    app_credentials_secret, master_password_secret, migration_properties_secret,
    app_secret_name, master_secret_name, migration_secret_name,
};
pub use volumes::{
    ebs_persistent_volume, efs_persistent_volume, fsx_snapshot, fsx_snapshot_content,
    fsx_snapshot_pvc, nfs_persistent_volume, persistent_volume_claim, shared_home_claim_name,
    shared_home_pv_name,
};

use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeMap;

use crate::config::OperatorConfig;
use crate::crd::AppStack;
use crate::provider::{DeletionPolicy, Tag};

/// Label applied to every object materialized for a record
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Owner references linking a dependent object to its parent record
pub fn owner_references(stack: &AppStack) -> Vec<OwnerReference> {
    vec![OwnerReference {
        api_version: "appstack.dev/v1alpha1".to_string(),
        kind: "AppStack".to_string(),
        name: stack.metadata.name.clone().unwrap_or_default(),
        uid: stack.metadata.uid.clone().unwrap_or_default(),
        block_owner_deletion: Some(true),
        ..Default::default()
    }]
}

/// Metadata for a cluster-scoped dependent object
pub fn cluster_meta(stack: &AppStack, name: impl Into<String>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        labels: Some(managed_labels()),
        owner_references: Some(owner_references(stack)),
        ..Default::default()
    }
}

/// Metadata for a namespaced dependent object
pub fn namespaced_meta(
    stack: &AppStack,
    name: impl Into<String>,
    namespace: impl Into<String>,
) -> ObjectMeta {
    ObjectMeta {
        namespace: Some(namespace.into()),
        ..cluster_meta(stack, name)
    }
}

fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(MANAGED_BY_LABEL.to_string(), "appstack".to_string())])
}

/// Deletion policy for provider resources of this record
///
/// `retainOnDelete` orphans the external cloud resource; the default
/// cascades the delete.
pub fn deletion_policy(stack: &AppStack) -> Option<DeletionPolicy> {
    stack.spec.retain_on_delete.then_some(DeletionPolicy::Orphan)
}

/// Tags applied to provider-managed cloud resources
///
/// Organizational tags come from configuration; a Name tag carrying the
/// record's deterministic identity is always appended.
pub fn resource_tags(stack: &AppStack, config: &OperatorConfig) -> Vec<Tag> {
    let mut tags: Vec<Tag> = config
        .resource_tags
        .iter()
        .map(|(k, v)| Tag {
            key: k.clone(),
            value: v.clone(),
        })
        .collect();
    tags.push(Tag {
        key: "Name".to_string(),
        value: stack.resource_name(),
    });
    tags
}

/// Isolation namespace for the record's namespaced dependents
pub fn namespace(stack: &AppStack) -> Namespace {
    let name = stack.metadata.name.clone().unwrap_or_default();
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            labels: Some(BTreeMap::from([
                (MANAGED_BY_LABEL.to_string(), "appstack".to_string()),
                ("owned_by".to_string(), name),
            ])),
            owner_references: Some(owner_references(stack)),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::crd::{
        AppStack, AppStackSpec, DatabaseSpec, EbsParams, EfsParams, FsxParams, GitOpsSpec,
        HelmChartSpec, HelmValuesSpec, NetworkSpec, SharedFsSpec, SyncPolicySpec,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    /// A fully-populated record for materializer and pipeline tests
    pub fn sample_stack(name: &str) -> AppStack {
        AppStack {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                uid: Some("6ba7b810".to_string()),
                ..Default::default()
            },
            spec: AppStackSpec {
                region: "ap-southeast-2".to_string(),
                hostname: format!("{name}.example.com"),
                retain_on_delete: false,
                provider_config_name: "aws-provider".to_string(),
                kms_key_id: "arn:aws:kms:key/test".to_string(),
                database: DatabaseSpec {
                    engine: "postgres".to_string(),
                    engine_version: "14.7".to_string(),
                    instance_class: "db.t3.medium".to_string(),
                    allocated_storage: 100,
                    snapshot_id: None,
                },
                network: NetworkSpec {
                    subnet_ids: vec![
                        "subnet-a".to_string(),
                        "subnet-b".to_string(),
                        "subnet-c".to_string(),
                    ],
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
                gitops: GitOpsSpec {
                    namespace: "argocd".to_string(),
                    project: "apps".to_string(),
                    helm_chart: HelmChartSpec {
                        repo_url: "https://charts.example.com".to_string(),
                        version: "1.2.3".to_string(),
                    },
                    helm_values: HelmValuesSpec {
                        git_repo: "https://git.example.com/values.git".to_string(),
                        git_revision: "main".to_string(),
                        values_files: vec!["values.yaml".to_string()],
                        value_overrides: String::new(),
                    },
                    sync_policy: SyncPolicySpec {
                        auto_sync: true,
                        apply_out_of_sync_only: false,
                    },
                    retain_on_delete: false,
                },
            },
            status: None,
        }
    }

    /// A record restoring its shared filesystem from a block-volume snapshot
    pub fn stack_with_ebs(name: &str) -> AppStack {
        let mut stack = sample_stack(name);
        stack.spec.shared_fs.ebs = Some(EbsParams {
            snapshot_id: "snap-0abc".to_string(),
            availability_zone: "a".to_string(),
            storage_class_name: "gp3".to_string(),
            fs_type: "ext4".to_string(),
        });
        stack
    }

    /// A record restoring its shared filesystem from a filesystem snapshot
    pub fn stack_with_fsx(name: &str) -> AppStack {
        let mut stack = sample_stack(name);
        stack.spec.shared_fs.fsx = Some(FsxParams {
            snapshot_id: "fsvolsnap-1".to_string(),
            csi_driver_name: "fsx.openzfs.csi.aws.com".to_string(),
            volume_snapshot_class_name: "fsx-snapclass".to_string(),
            restore_storage_class_name: "fsx-sc".to_string(),
        });
        stack
    }
}
