//! Shared filesystem materializers
//!
//! Builds the managed filesystem, its per-subnet mount targets and the
//! restored block volume. Mount target identity folds the subnet index
//! into the name so each subnet maps to exactly one target.

use crate::config::OperatorConfig;
use crate::crd::AppStack;
use crate::provider::{
    FileSystem, FileSystemParameters, FileSystemSpec, MountTarget, MountTargetParameters,
    MountTargetSpec, Reference, ResourceSpec, SecretReference, Volume, VolumeParameters,
    VolumeSpec,
};

use super::{cluster_meta, deletion_policy, resource_tags};

fn provider_spec(stack: &AppStack) -> ResourceSpec {
    ResourceSpec {
        provider_config_ref: Some(Reference {
            name: stack.spec.provider_config_name.clone(),
        }),
        deletion_policy: deletion_policy(stack),
        ..Default::default()
    }
}

/// Managed shared filesystem for the record, encrypted with its key
pub fn efs_filesystem(stack: &AppStack, config: &OperatorConfig, namespace: &str) -> FileSystem {
    let record = stack.metadata.name.clone().unwrap_or_default();
    FileSystem {
        metadata: cluster_meta(stack, stack.resource_name()),
        spec: FileSystemSpec {
            resource_spec: ResourceSpec {
                write_connection_secret_to_ref: Some(SecretReference {
                    name: format!("{record}-fs-connection"),
                    namespace: namespace.to_string(),
                }),
                ..provider_spec(stack)
            },
            for_provider: FileSystemParameters {
                region: stack.spec.region.clone(),
                encrypted: true,
                kms_key_id: stack.spec.kms_key_id.clone(),
                tags: resource_tags(stack, config),
            },
        },
        status: None,
    }
}

/// Deterministic name of the mount target for the subnet at `index`
pub fn mount_target_name(stack: &AppStack, index: usize) -> String {
    format!(
        "{}{}-{}",
        stack.metadata.name.as_deref().unwrap_or_default(),
        index,
        stack.metadata.uid.as_deref().unwrap_or_default()
    )
}

/// Mount target exposing `filesystem_id` in the subnet at `index`
pub fn mount_target(stack: &AppStack, filesystem_id: &str, index: usize) -> MountTarget {
    MountTarget {
        metadata: cluster_meta(stack, mount_target_name(stack, index)),
        spec: MountTargetSpec {
            resource_spec: provider_spec(stack),
            for_provider: MountTargetParameters {
                region: stack.spec.region.clone(),
                file_system_id: filesystem_id.to_string(),
                subnet_id: stack.spec.network.subnet_ids[index].clone(),
                security_groups: stack.spec.network.security_group_ids.clone(),
            },
        },
        status: None,
    }
}

/// Block volume restored from the configured snapshot
///
/// The availability zone is the record's region plus the configured zone
/// suffix; encryption follows the presence of an encryption key.
pub fn ebs_volume(stack: &AppStack, config: &OperatorConfig) -> Volume {
    // strategy() guarantees the block is present before this branch runs
    let ebs = stack.spec.shared_fs.ebs.clone().unwrap_or_default();
    Volume {
        metadata: cluster_meta(stack, stack.resource_name()),
        spec: VolumeSpec {
            resource_spec: provider_spec(stack),
            for_provider: VolumeParameters {
                region: stack.spec.region.clone(),
                availability_zone: format!("{}{}", stack.spec.region, ebs.availability_zone),
                encrypted: !stack.spec.kms_key_id.is_empty(),
                size: stack.spec.shared_fs.volume_size,
                snapshot_id: ebs.snapshot_id,
                kms_key_id: stack.spec.kms_key_id.clone(),
                tags: resource_tags(stack, config),
            },
        },
        status: None,
    }
}
