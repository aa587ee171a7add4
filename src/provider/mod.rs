//! Provisioning-provider resource types
//!
//! Typed definitions for the external provider objects the controller
//! creates: a `spec.forProvider` parameter block describes the desired cloud
//! resource and `status.atProvider` carries the provider's observed fields.
//! The driver only ever reads specific leaf fields from the observed block.

mod ec2;
mod efs;
mod rds;
mod snapshot;

pub use ec2::{Volume, VolumeObservation, VolumeParameters, VolumeSpec, VolumeStatus};
pub use efs::{
    FileSystem, FileSystemObservation, FileSystemParameters, FileSystemSpec, FileSystemStatus,
    MountTarget, MountTargetObservation, MountTargetParameters, MountTargetSpec,
    MountTargetStatus,
};
pub use rds::{
    DBParameterGroup, DBParameterGroupParameters, DBParameterGroupSpec, DBSubnetGroup,
    DBSubnetGroupParameters, DBSubnetGroupSpec, DbParameter, Endpoint, RDSInstance,
    RDSInstanceObservation, RDSInstanceParameters, RDSInstanceSpec, RDSInstanceStatus,
    RestoreFrom, SnapshotRestore,
};
pub use snapshot::{
    VolumeSnapshot, VolumeSnapshotContent, VolumeSnapshotContentSource,
    VolumeSnapshotContentSpec, VolumeSnapshotRef, VolumeSnapshotSource, VolumeSnapshotSpec,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a provider config by name
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Reference {
    /// Name of the referenced object
    pub name: String,
}

/// Reference to a secret by namespace and name
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct SecretReference {
    /// Name of the secret
    pub name: String,
    /// Namespace of the secret
    pub namespace: String,
}

/// Reference to a single key of a secret
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct SecretKeySelector {
    /// The referenced secret
    #[serde(flatten)]
    pub secret_ref: SecretReference,
    /// Key within the secret
    pub key: String,
}

/// What happens to the external cloud resource when the object is deleted
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub enum DeletionPolicy {
    /// Delete the external resource together with the object
    #[default]
    Delete,
    /// Leave the external resource in place
    Orphan,
}

/// Key/value tag applied to a cloud resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct Tag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

/// Fields shared by every provider resource spec
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// Provider config the resource is provisioned through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<Reference>,

    /// Secret the provider writes connection details to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,

    /// Deletion policy for the external resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_policy_serializes_as_pascal_case() {
        assert_eq!(
            serde_json::to_value(DeletionPolicy::Orphan).unwrap(),
            serde_json::json!("Orphan")
        );
    }

    #[test]
    fn resource_spec_omits_absent_fields() {
        let value = serde_json::to_value(ResourceSpec::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
