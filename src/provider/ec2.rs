//! Block volume resource types (ec2.aws.crossplane.io)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ResourceSpec, Tag};

/// Desired state of a block volume
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeParameters {
    /// Region the volume is created in
    pub region: String,

    /// Availability zone the volume is pinned to
    pub availability_zone: String,

    /// Whether the volume is encrypted
    #[serde(default)]
    pub encrypted: bool,

    /// Volume size in GiB
    pub size: i64,

    /// Snapshot the volume is restored from
    #[serde(default, rename = "snapshotID", skip_serializing_if = "String::is_empty")]
    pub snapshot_id: String,

    /// Encryption key reference
    #[serde(default, rename = "kmsKeyID", skip_serializing_if = "String::is_empty")]
    pub kms_key_id: String,

    /// Tags applied to the volume
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Observed state of a block volume
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeObservation {
    /// Assigned volume identifier, absent until provisioned
    #[serde(default, rename = "volumeID", skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
}

/// Status block for a block volume
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeStatus {
    /// Provider-observed fields
    #[serde(default)]
    pub at_provider: VolumeObservation,
}

/// Block volume managed by the provisioning provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "ec2.aws.crossplane.io",
    version = "v1alpha1",
    kind = "Volume",
    status = "VolumeStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Provider resource plumbing
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired volume parameters
    pub for_provider: VolumeParameters,
}
