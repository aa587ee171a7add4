//! Managed database resource types (database.aws.crossplane.io)

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{ResourceSpec, SecretKeySelector, Tag};

/// Endpoint published by the provider once the instance is reachable
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Snapshot source for a restored instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRestore {
    /// Snapshot identifier to restore from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_identifier: Option<String>,
}

/// Restore configuration for an instance created from a backup
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestoreFrom {
    /// Backup source type ("Snapshot")
    pub source: String,
    /// Snapshot restore parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotRestore>,
}

/// Desired state of a database instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RDSInstanceParameters {
    /// Region the instance is created in
    pub region: String,

    /// Allocated storage in GiB
    pub allocated_storage: i64,

    /// Instance class
    pub db_instance_class: String,

    /// Security groups attached to the instance
    #[serde(default, rename = "vpcSecurityGroupIDs")]
    pub vpc_security_group_ids: Vec<String>,

    /// Parameter group the instance uses, by materialized name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_parameter_group_name: Option<String>,

    /// Subnet group the instance is placed in, by materialized name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_subnet_group_name: Option<String>,

    /// Database engine
    pub engine: String,

    /// Engine version
    pub engine_version: String,

    /// Encryption key reference
    #[serde(default, rename = "kmsKeyID", skip_serializing_if = "String::is_empty")]
    pub kms_key_id: String,

    /// Master username
    pub master_username: String,

    /// Secret key holding the master password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_password_secret_ref: Option<SecretKeySelector>,

    /// Skip the final snapshot when the instance is deleted
    #[serde(default)]
    pub skip_final_snapshot_before_deletion: bool,

    /// Apply modifications immediately instead of in the maintenance window
    #[serde(default)]
    pub apply_modifications_immediately: bool,

    /// Tags applied to the instance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Restore source when the instance is created from a snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_from: Option<RestoreFrom>,
}

/// Observed state of a database instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RDSInstanceObservation {
    /// Provider lifecycle phase ("creating", "available", ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub db_instance_status: String,

    /// Connection endpoint, absent until published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
}

/// Status block for a database instance
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RDSInstanceStatus {
    /// Provider-observed fields
    #[serde(default)]
    pub at_provider: RDSInstanceObservation,
}

/// Database instance managed by the provisioning provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.aws.crossplane.io",
    version = "v1beta1",
    kind = "RDSInstance",
    status = "RDSInstanceStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct RDSInstanceSpec {
    /// Provider resource plumbing (config ref, connection secret, policy)
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired instance parameters
    pub for_provider: RDSInstanceParameters,
}

/// Desired state of a database subnet group
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DBSubnetGroupParameters {
    /// Region the group is created in
    pub region: String,

    /// Human-readable description
    pub description: String,

    /// Subnets in the group
    #[serde(default, rename = "subnetIDs")]
    pub subnet_ids: Vec<String>,

    /// Tags applied to the group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Database subnet group managed by the provisioning provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "database.aws.crossplane.io",
    version = "v1beta1",
    kind = "DBSubnetGroup"
)]
#[serde(rename_all = "camelCase")]
pub struct DBSubnetGroupSpec {
    /// Provider resource plumbing
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired subnet group parameters
    pub for_provider: DBSubnetGroupParameters,
}

/// A single engine parameter override
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DbParameter {
    /// Parameter name
    pub parameter_name: String,
    /// Parameter value
    pub parameter_value: String,
    /// When the change is applied ("immediate")
    pub apply_method: String,
}

/// Desired state of a database parameter group
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DBParameterGroupParameters {
    /// Region the group is created in
    pub region: String,

    /// Human-readable description
    pub description: String,

    /// Engine parameter family (e.g. "postgres14")
    pub db_parameter_group_family: String,

    /// Engine parameter overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<DbParameter>,

    /// Tags applied to the group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Database parameter group managed by the provisioning provider
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "rds.aws.crossplane.io",
    version = "v1alpha1",
    kind = "DBParameterGroup"
)]
#[serde(rename_all = "camelCase")]
pub struct DBParameterGroupSpec {
    /// Provider resource plumbing
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired parameter group parameters
    pub for_provider: DBParameterGroupParameters,
}
