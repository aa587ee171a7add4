//! Shared specification types for the AppStack CRD

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Managed database specification
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
    /// Database engine (e.g. "postgres")
    pub engine: String,

    /// Engine version (e.g. "14.7")
    pub engine_version: String,

    /// Provider instance class (e.g. "db.t3.medium")
    pub instance_class: String,

    /// Allocated storage in GiB
    pub allocated_storage: i64,

    /// Snapshot identifier to restore the instance from
    ///
    /// When set, the instance is created from the snapshot and a
    /// credential-reset job runs before schema migration, because a restored
    /// instance keeps the snapshot's master password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

/// Network placement for provider resources and the application ingress
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// Subnets the database and filesystem mount targets are placed in
    #[serde(default)]
    pub subnet_ids: Vec<String>,

    /// Security groups attached to provider resources
    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// Parameters for a newly provisioned shared filesystem
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EfsParams {
    /// Storage class for the shared-home claim
    pub storage_class_name: String,

    /// CSI driver backing the shared filesystem persistent volume
    pub csi_driver_name: String,
}

/// Parameters for restoring the shared filesystem from a block-volume snapshot
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EbsParams {
    /// Block-volume snapshot to restore from
    pub snapshot_id: String,

    /// Availability-zone suffix the volume and NFS server are pinned to
    /// (appended to the spec region, e.g. "a")
    pub availability_zone: String,

    /// Storage class for the NFS server claim
    pub storage_class_name: String,

    /// Filesystem type of the restored volume (e.g. "ext4")
    pub fs_type: String,
}

/// Parameters for restoring the shared filesystem from a filesystem snapshot
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FsxParams {
    /// Stored snapshot handle the snapshot-content object references
    pub snapshot_id: String,

    /// CSI driver for the snapshot content
    pub csi_driver_name: String,

    /// VolumeSnapshotClass for the snapshot objects
    pub volume_snapshot_class_name: String,

    /// Storage class for the snapshot-sourced claim
    pub restore_storage_class_name: String,
}

/// Shared filesystem specification
///
/// The restore paths are mutually exclusive; [`SharedFsSpec::strategy`] is the
/// single place that collapses the optional blocks into one strategy.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharedFsSpec {
    /// Size of the shared filesystem volume in GiB
    pub volume_size: i64,

    /// Parameters for the new-filesystem path (also supplies the storage
    /// class and CSI driver used by the shared-home claim)
    #[serde(default)]
    pub efs: EfsParams,

    /// Block-volume snapshot restore parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebs: Option<EbsParams>,

    /// Filesystem snapshot restore parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsx: Option<FsxParams>,
}

/// The provisioning strategy selected from a [`SharedFsSpec`]
///
/// Exactly one strategy runs per invocation. Selection is deterministic:
/// a block-volume snapshot takes precedence over a filesystem snapshot,
/// and the absence of both selects a new filesystem.
#[derive(Debug, PartialEq)]
pub enum FsStrategy<'a> {
    /// Restore a block volume from a snapshot and serve it over NFS
    RestoreBlockVolume(&'a EbsParams),
    /// Restore a claim from a stored filesystem snapshot handle
    RestoreFilesystemSnapshot(&'a FsxParams),
    /// Provision a new shared filesystem with per-subnet mount targets
    NewFilesystem(&'a EfsParams),
}

impl SharedFsSpec {
    /// Select the provisioning strategy for this spec
    pub fn strategy(&self) -> FsStrategy<'_> {
        if let Some(ebs) = self.ebs.as_ref().filter(|e| !e.snapshot_id.is_empty()) {
            return FsStrategy::RestoreBlockVolume(ebs);
        }
        if let Some(fsx) = self.fsx.as_ref().filter(|f| !f.snapshot_id.is_empty()) {
            return FsStrategy::RestoreFilesystemSnapshot(fsx);
        }
        FsStrategy::NewFilesystem(&self.efs)
    }
}

/// Helm chart coordinates for the GitOps deployment
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartSpec {
    /// Chart repository URL
    pub repo_url: String,

    /// Chart version
    pub version: String,
}

/// Helm values sources for the GitOps deployment
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmValuesSpec {
    /// Git repository holding values files
    pub git_repo: String,

    /// Git revision of the values repository
    pub git_revision: String,

    /// Values files applied in order
    #[serde(default)]
    pub values_files: Vec<String>,

    /// Inline value overrides (raw YAML)
    #[serde(default)]
    pub value_overrides: String,
}

/// Sync policy flags for the GitOps deployment
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicySpec {
    /// Whether the deployment controller syncs automatically
    #[serde(default)]
    pub auto_sync: bool,

    /// Only apply resources that are out of sync
    #[serde(default)]
    pub apply_out_of_sync_only: bool,
}

/// GitOps deployment specification
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsSpec {
    /// Namespace the deployment controller runs in
    pub namespace: String,

    /// Deployment controller project the application belongs to
    pub project: String,

    /// Chart coordinates
    pub helm_chart: HelmChartSpec,

    /// Values sources
    pub helm_values: HelmValuesSpec,

    /// Sync policy flags
    #[serde(default)]
    pub sync_policy: SyncPolicySpec,

    /// Keep the deployed application when the record is deleted
    #[serde(default)]
    pub retain_on_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_spec(ebs_snapshot: &str, fsx_snapshot: &str) -> SharedFsSpec {
        SharedFsSpec {
            volume_size: 100,
            efs: EfsParams::default(),
            ebs: (!ebs_snapshot.is_empty()).then(|| EbsParams {
                snapshot_id: ebs_snapshot.to_string(),
                ..Default::default()
            }),
            fsx: (!fsx_snapshot.is_empty()).then(|| FsxParams {
                snapshot_id: fsx_snapshot.to_string(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn absent_snapshots_select_new_filesystem() {
        let spec = fs_spec("", "");
        assert!(matches!(spec.strategy(), FsStrategy::NewFilesystem(_)));
    }

    #[test]
    fn block_volume_snapshot_selects_restore() {
        let spec = fs_spec("snap-0abc", "");
        assert!(matches!(
            spec.strategy(),
            FsStrategy::RestoreBlockVolume(e) if e.snapshot_id == "snap-0abc"
        ));
    }

    #[test]
    fn filesystem_snapshot_selects_restore() {
        let spec = fs_spec("", "fsvolsnap-1");
        assert!(matches!(
            spec.strategy(),
            FsStrategy::RestoreFilesystemSnapshot(f) if f.snapshot_id == "fsvolsnap-1"
        ));
    }

    #[test]
    fn block_volume_takes_precedence_when_both_set() {
        let spec = fs_spec("snap-0abc", "fsvolsnap-1");
        assert!(matches!(spec.strategy(), FsStrategy::RestoreBlockVolume(_)));
    }

    #[test]
    fn empty_snapshot_id_does_not_select_restore() {
        // A present block with an empty id behaves like an absent block.
        let mut spec = fs_spec("", "");
        spec.ebs = Some(EbsParams::default());
        assert!(matches!(spec.strategy(), FsStrategy::NewFilesystem(_)));
    }

    #[test]
    fn strategy_is_stable_across_calls() {
        let spec = fs_spec("snap-0abc", "fsvolsnap-1");
        for _ in 0..3 {
            assert!(matches!(spec.strategy(), FsStrategy::RestoreBlockVolume(_)));
        }
    }
}
