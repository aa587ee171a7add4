//! CSI volume snapshot API types (snapshot.storage.k8s.io)
//!
//! Used by the filesystem-snapshot restore strategy to import a stored
//! snapshot handle and source a claim from it.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to the snapshot object a content binds to
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotRef {
    /// Kind of the referenced object ("VolumeSnapshot")
    pub kind: String,
    /// Namespace of the referenced snapshot
    pub namespace: String,
    /// Name of the referenced snapshot
    pub name: String,
}

/// Source of a pre-provisioned snapshot content
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSource {
    /// Stored snapshot handle to import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_handle: Option<String>,
}

/// Pre-provisioned snapshot content importing a stored snapshot handle
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "snapshot.storage.k8s.io",
    version = "v1",
    kind = "VolumeSnapshotContent"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotContentSpec {
    /// Snapshot object this content binds to
    pub volume_snapshot_ref: VolumeSnapshotRef,

    /// CSI driver that owns the snapshot
    pub driver: String,

    /// VolumeSnapshotClass for the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,

    /// Imported snapshot source
    pub source: VolumeSnapshotContentSource,

    /// What happens to the snapshot when the content is deleted
    pub deletion_policy: String,
}

/// Source of a snapshot object
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSource {
    /// Pre-provisioned content this snapshot binds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_content_name: Option<String>,
}

/// Namespaced snapshot object claims can be sourced from
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "snapshot.storage.k8s.io",
    version = "v1",
    kind = "VolumeSnapshot",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSnapshotSpec {
    /// Snapshot source
    pub source: VolumeSnapshotSource,

    /// VolumeSnapshotClass for the snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_snapshot_class_name: Option<String>,
}
