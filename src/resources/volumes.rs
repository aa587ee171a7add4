//! Persistent volume and snapshot materializers
//!
//! Each provisioning strategy ends in a pre-bound persistent volume (or a
//! snapshot-sourced claim) named for the shared home the application
//! mounts. Claim refs pre-bind volumes to their claims so the scheduler
//! never matches them elsewhere.

use k8s_openapi::api::core::v1::{
    AWSElasticBlockStoreVolumeSource, CSIPersistentVolumeSource, NFSVolumeSource, NodeSelector,
    ObjectReference, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeSpec, TypedLocalObjectReference, VolumeNodeAffinity,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

use crate::crd::AppStack;
use crate::provider::{
    VolumeSnapshot, VolumeSnapshotContent, VolumeSnapshotContentSource,
    VolumeSnapshotContentSpec, VolumeSnapshotRef, VolumeSnapshotSource, VolumeSnapshotSpec,
};

use super::nfs::{nfs_server_name, zone_affinity_terms, NFS_EXPORT_PATH};
use super::{cluster_meta, namespaced_meta};

/// Name of the shared-home persistent volume for the record
pub fn shared_home_pv_name(stack: &AppStack) -> String {
    format!("{}-shared-home", stack.resource_name())
}

/// Name of the shared-home claim the application mounts
pub fn shared_home_claim_name(record: &str) -> String {
    format!("{record}-shared-home")
}

fn gibibytes(size: i64) -> BTreeMap<String, Quantity> {
    BTreeMap::from([("storage".to_string(), Quantity(format!("{size}Gi")))])
}

fn claim_ref(namespace: &str, name: String) -> ObjectReference {
    ObjectReference {
        kind: Some("PersistentVolumeClaim".to_string()),
        namespace: Some(namespace.to_string()),
        name: Some(name),
        ..Default::default()
    }
}

/// Shared-home volume served by the in-cluster NFS server
pub fn nfs_persistent_volume(stack: &AppStack, cluster_ip: &str, namespace: &str) -> PersistentVolume {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let storage_class = stack
        .spec
        .shared_fs
        .ebs
        .as_ref()
        .map(|ebs| ebs.storage_class_name.clone())
        .unwrap_or_default();
    PersistentVolume {
        metadata: cluster_meta(stack, shared_home_pv_name(stack)),
        spec: Some(PersistentVolumeSpec {
            capacity: Some(gibibytes(stack.spec.shared_fs.volume_size)),
            nfs: Some(NFSVolumeSource {
                server: cluster_ip.to_string(),
                path: NFS_EXPORT_PATH.to_string(),
                ..Default::default()
            }),
            access_modes: Some(vec!["ReadWriteMany".to_string()]),
            claim_ref: Some(claim_ref(namespace, shared_home_claim_name(&record))),
            persistent_volume_reclaim_policy: Some("Retain".to_string()),
            storage_class_name: Some(storage_class),
            ..Default::default()
        }),
        status: None,
    }
}

/// Shared-home volume backed by the managed filesystem's CSI handle
pub fn efs_persistent_volume(stack: &AppStack, filesystem_id: &str, namespace: &str) -> PersistentVolume {
    let record = stack.metadata.name.clone().unwrap_or_default();
    PersistentVolume {
        metadata: cluster_meta(stack, shared_home_pv_name(stack)),
        spec: Some(PersistentVolumeSpec {
            capacity: Some(gibibytes(10)),
            csi: Some(CSIPersistentVolumeSource {
                driver: stack.spec.shared_fs.efs.csi_driver_name.clone(),
                volume_handle: filesystem_id.to_string(),
                read_only: Some(false),
                ..Default::default()
            }),
            access_modes: Some(vec!["ReadWriteMany".to_string()]),
            claim_ref: Some(claim_ref(namespace, shared_home_claim_name(&record))),
            persistent_volume_reclaim_policy: Some("Retain".to_string()),
            storage_class_name: Some(stack.spec.shared_fs.efs.storage_class_name.clone()),
            ..Default::default()
        }),
        status: None,
    }
}

/// Restored block volume, zone-pinned and bound to the NFS server's claim
pub fn ebs_persistent_volume(stack: &AppStack, volume_id: &str, namespace: &str) -> PersistentVolume {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let server = nfs_server_name(&record);
    let ebs = stack.spec.shared_fs.ebs.clone().unwrap_or_default();
    PersistentVolume {
        metadata: cluster_meta(
            stack,
            format!("{server}-{}", stack.metadata.uid.as_deref().unwrap_or_default()),
        ),
        spec: Some(PersistentVolumeSpec {
            capacity: Some(gibibytes(stack.spec.shared_fs.volume_size)),
            aws_elastic_block_store: Some(AWSElasticBlockStoreVolumeSource {
                volume_id: volume_id.to_string(),
                fs_type: Some(ebs.fs_type),
                ..Default::default()
            }),
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            claim_ref: Some(claim_ref(namespace, server)),
            persistent_volume_reclaim_policy: Some("Retain".to_string()),
            storage_class_name: Some(ebs.storage_class_name),
            node_affinity: Some(VolumeNodeAffinity {
                required: Some(NodeSelector {
                    node_selector_terms: zone_affinity_terms(stack),
                }),
            }),
            ..Default::default()
        }),
        status: None,
    }
}

/// Claim pre-bound to `volume_name`
pub fn persistent_volume_claim(
    stack: &AppStack,
    name: String,
    namespace: &str,
    volume_name: String,
    storage_class: String,
    size: i64,
    access_mode: &str,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: namespaced_meta(stack, name, namespace),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![access_mode.to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(gibibytes(size)),
                ..Default::default()
            }),
            volume_name: Some(volume_name),
            storage_class_name: Some(storage_class),
            ..Default::default()
        }),
        status: None,
    }
}

/// Pre-provisioned snapshot content importing the stored filesystem snapshot
pub fn fsx_snapshot_content(stack: &AppStack, namespace: &str) -> VolumeSnapshotContent {
    let name = stack.resource_name();
    let fsx = stack.spec.shared_fs.fsx.clone().unwrap_or_default();
    VolumeSnapshotContent {
        metadata: cluster_meta(stack, &name),
        spec: VolumeSnapshotContentSpec {
            volume_snapshot_ref: VolumeSnapshotRef {
                kind: "VolumeSnapshot".to_string(),
                namespace: namespace.to_string(),
                name,
            },
            driver: fsx.csi_driver_name,
            volume_snapshot_class_name: Some(fsx.volume_snapshot_class_name),
            source: VolumeSnapshotContentSource {
                snapshot_handle: Some(fsx.snapshot_id),
            },
            deletion_policy: "Retain".to_string(),
        },
    }
}

/// Snapshot object binding to the imported content
pub fn fsx_snapshot(stack: &AppStack, namespace: &str) -> VolumeSnapshot {
    let name = stack.resource_name();
    let fsx = stack.spec.shared_fs.fsx.clone().unwrap_or_default();
    VolumeSnapshot {
        metadata: namespaced_meta(stack, &name, namespace),
        spec: VolumeSnapshotSpec {
            source: VolumeSnapshotSource {
                volume_snapshot_content_name: Some(name),
            },
            volume_snapshot_class_name: Some(fsx.volume_snapshot_class_name),
        },
    }
}

/// Shared-home claim sourced from the imported snapshot
pub fn fsx_snapshot_pvc(stack: &AppStack, namespace: &str) -> PersistentVolumeClaim {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let fsx = stack.spec.shared_fs.fsx.clone().unwrap_or_default();
    PersistentVolumeClaim {
        metadata: namespaced_meta(stack, shared_home_claim_name(&record), namespace),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteMany".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(gibibytes(stack.spec.shared_fs.volume_size)),
                ..Default::default()
            }),
            storage_class_name: Some(fsx.restore_storage_class_name),
            data_source: Some(TypedLocalObjectReference {
                api_group: Some("snapshot.storage.k8s.io".to_string()),
                kind: "VolumeSnapshot".to_string(),
                name: stack.resource_name(),
            }),
            ..Default::default()
        }),
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{sample_stack, stack_with_ebs, stack_with_fsx};
    use super::*;

    #[test]
    fn efs_volume_binds_the_shared_home_claim() {
        let stack = sample_stack("wiki");
        let pv = efs_persistent_volume(&stack, "fs-123", "wiki");
        assert_eq!(
            pv.metadata.name.as_deref(),
            Some("wiki-6ba7b810-shared-home")
        );
        let spec = pv.spec.unwrap();
        let csi = spec.csi.unwrap();
        assert_eq!(csi.driver, "efs.csi.aws.com");
        assert_eq!(csi.volume_handle, "fs-123");
        let claim = spec.claim_ref.unwrap();
        assert_eq!(claim.name.as_deref(), Some("wiki-shared-home"));
        assert_eq!(claim.namespace.as_deref(), Some("wiki"));
    }

    #[test]
    fn ebs_volume_is_zone_pinned_and_read_write_once() {
        let stack = stack_with_ebs("wiki");
        let pv = ebs_persistent_volume(&stack, "vol-1", "wiki");
        let spec = pv.spec.unwrap();
        assert_eq!(spec.access_modes.unwrap(), vec!["ReadWriteOnce"]);
        let source = spec.aws_elastic_block_store.unwrap();
        assert_eq!(source.volume_id, "vol-1");
        assert_eq!(source.fs_type.as_deref(), Some("ext4"));
        assert!(spec.node_affinity.is_some());
        assert_eq!(
            spec.claim_ref.unwrap().name.as_deref(),
            Some("wiki-nfs-server")
        );
    }

    #[test]
    fn nfs_volume_points_at_the_server_export() {
        let stack = stack_with_ebs("wiki");
        let pv = nfs_persistent_volume(&stack, "10.0.0.9", "wiki");
        let spec = pv.spec.unwrap();
        let nfs = spec.nfs.unwrap();
        assert_eq!(nfs.server, "10.0.0.9");
        assert_eq!(nfs.path, "/srv/nfs");
        assert_eq!(spec.access_modes.unwrap(), vec!["ReadWriteMany"]);
    }

    #[test]
    fn claim_is_pre_bound_to_its_volume() {
        let stack = sample_stack("wiki");
        let pvc = persistent_volume_claim(
            &stack,
            "wiki-shared-home".to_string(),
            "wiki",
            "wiki-6ba7b810-shared-home".to_string(),
            "efs-sc".to_string(),
            10,
            "ReadWriteMany",
        );
        let spec = pvc.spec.unwrap();
        assert_eq!(
            spec.volume_name.as_deref(),
            Some("wiki-6ba7b810-shared-home")
        );
        assert_eq!(
            spec.resources.unwrap().requests.unwrap()["storage"],
            Quantity("10Gi".to_string())
        );
    }

    #[test]
    fn snapshot_chain_shares_one_identity() {
        let stack = stack_with_fsx("wiki");
        let content = fsx_snapshot_content(&stack, "wiki");
        let snapshot = fsx_snapshot(&stack, "wiki");
        let claim = fsx_snapshot_pvc(&stack, "wiki");

        assert_eq!(content.metadata.name.as_deref(), Some("wiki-6ba7b810"));
        assert_eq!(
            content.spec.source.snapshot_handle.as_deref(),
            Some("fsvolsnap-1")
        );
        assert_eq!(content.spec.deletion_policy, "Retain");
        assert_eq!(
            snapshot.spec.source.volume_snapshot_content_name.as_deref(),
            Some("wiki-6ba7b810")
        );
        let source = claim.spec.unwrap().data_source.unwrap();
        assert_eq!(source.kind, "VolumeSnapshot");
        assert_eq!(source.name, "wiki-6ba7b810");
    }
}
