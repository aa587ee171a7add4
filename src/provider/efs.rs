//! Shared filesystem resource types (efs.aws.crossplane.io)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ResourceSpec, Tag};

/// Desired state of a shared filesystem
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemParameters {
    /// Region the filesystem is created in
    pub region: String,

    /// Whether the filesystem is encrypted at rest
    #[serde(default)]
    pub encrypted: bool,

    /// Encryption key reference
    #[serde(default, rename = "kmsKeyID", skip_serializing_if = "String::is_empty")]
    pub kms_key_id: String,

    /// Tags applied to the filesystem
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Observed state of a shared filesystem
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemObservation {
    /// Assigned filesystem identifier, absent until provisioned
    #[serde(default, rename = "fileSystemID", skip_serializing_if = "Option::is_none")]
    pub file_system_id: Option<String>,
}

/// Status block for a shared filesystem
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemStatus {
    /// Provider-observed fields
    #[serde(default)]
    pub at_provider: FileSystemObservation,
}

/// Shared filesystem managed by the provisioning provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "efs.aws.crossplane.io",
    version = "v1alpha1",
    kind = "FileSystem",
    status = "FileSystemStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemSpec {
    /// Provider resource plumbing
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired filesystem parameters
    pub for_provider: FileSystemParameters,
}

/// Desired state of a filesystem mount target
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MountTargetParameters {
    /// Region the mount target is created in
    pub region: String,

    /// Filesystem the target exposes
    #[serde(rename = "fileSystemID")]
    pub file_system_id: String,

    /// Subnet the target is placed in
    #[serde(rename = "subnetID")]
    pub subnet_id: String,

    /// Security groups attached to the target
    #[serde(default)]
    pub security_groups: Vec<String>,
}

/// Observed state of a filesystem mount target
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MountTargetObservation {
    /// Lifecycle state ("creating", "available", ...), absent until known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_cycle_state: Option<String>,
}

/// Status block for a filesystem mount target
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MountTargetStatus {
    /// Provider-observed fields
    #[serde(default)]
    pub at_provider: MountTargetObservation,
}

/// Filesystem mount target managed by the provisioning provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "efs.aws.crossplane.io",
    version = "v1alpha1",
    kind = "MountTarget",
    status = "MountTargetStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct MountTargetSpec {
    /// Provider resource plumbing
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired mount target parameters
    pub for_provider: MountTargetParameters,
}
