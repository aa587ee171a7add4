//! Database materializers
//!
//! Builds the managed database instance and its placement groups. The
//! instance references the subnet and parameter groups by their
//! deterministic names and reads the master password from the record's
//! master-password secret.

use crate::config::OperatorConfig;
use crate::crd::AppStack;
use crate::provider::{
    DBParameterGroup, DBParameterGroupParameters, DBParameterGroupSpec, DBSubnetGroup,
    DBSubnetGroupParameters, DBSubnetGroupSpec, DbParameter, RDSInstance, RDSInstanceParameters,
    RDSInstanceSpec, Reference, ResourceSpec, RestoreFrom, SecretKeySelector, SecretReference,
    SnapshotRestore,
};

use super::{cluster_meta, deletion_policy, master_secret_name, resource_tags};

fn provider_ref(stack: &AppStack) -> ResourceSpec {
    ResourceSpec {
        provider_config_ref: Some(Reference {
            name: stack.spec.provider_config_name.clone(),
        }),
        ..Default::default()
    }
}

/// Managed database instance for the record
///
/// When the database block carries a snapshot identifier the instance is
/// restored from that snapshot instead of created empty.
pub fn rds_instance(stack: &AppStack, config: &OperatorConfig, namespace: &str) -> RDSInstance {
    let name = stack.resource_name();
    let record = stack.metadata.name.clone().unwrap_or_default();

    let mut for_provider = RDSInstanceParameters {
        region: stack.spec.region.clone(),
        allocated_storage: stack.spec.database.allocated_storage,
        db_instance_class: stack.spec.database.instance_class.clone(),
        vpc_security_group_ids: stack.spec.network.security_group_ids.clone(),
        db_parameter_group_name: Some(name.clone()),
        db_subnet_group_name: Some(name.clone()),
        engine: stack.spec.database.engine.clone(),
        engine_version: stack.spec.database.engine_version.clone(),
        kms_key_id: stack.spec.kms_key_id.clone(),
        master_username: config.db_master_username.clone(),
        master_password_secret_ref: Some(SecretKeySelector {
            secret_ref: SecretReference {
                name: master_secret_name(&record),
                namespace: namespace.to_string(),
            },
            key: "password".to_string(),
        }),
        skip_final_snapshot_before_deletion: true,
        apply_modifications_immediately: true,
        tags: resource_tags(stack, config),
        restore_from: None,
    };

    if let Some(snapshot) = stack
        .spec
        .database
        .snapshot_id
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        for_provider.restore_from = Some(RestoreFrom {
            source: "Snapshot".to_string(),
            snapshot: Some(SnapshotRestore {
                snapshot_identifier: Some(snapshot.to_string()),
            }),
        });
    }

    RDSInstance {
        metadata: cluster_meta(stack, &name),
        spec: RDSInstanceSpec {
            resource_spec: ResourceSpec {
                write_connection_secret_to_ref: Some(SecretReference {
                    name: format!("{record}-db-connection"),
                    namespace: namespace.to_string(),
                }),
                deletion_policy: deletion_policy(stack),
                ..provider_ref(stack)
            },
            for_provider,
        },
        status: None,
    }
}

/// Subnet group placing the database instance in the record's subnets
pub fn db_subnet_group(stack: &AppStack, config: &OperatorConfig) -> DBSubnetGroup {
    let record = stack.metadata.name.clone().unwrap_or_default();
    DBSubnetGroup {
        metadata: cluster_meta(stack, stack.resource_name()),
        spec: DBSubnetGroupSpec {
            resource_spec: provider_ref(stack),
            for_provider: DBSubnetGroupParameters {
                region: stack.spec.region.clone(),
                description: format!("Subnet group for the {record} database instance"),
                subnet_ids: stack.spec.network.subnet_ids.clone(),
                tags: resource_tags(stack, config),
            },
        },
    }
}

/// Engine parameter group with the record's logging overrides
///
/// The parameter family is derived from the engine plus the major version
/// of the configured engine version.
pub fn db_parameter_group(stack: &AppStack, config: &OperatorConfig) -> DBParameterGroup {
    let major = stack
        .spec
        .database
        .engine_version
        .split('.')
        .next()
        .unwrap_or_default();

    let parameter = |name: &str, value: &str| DbParameter {
        parameter_name: name.to_string(),
        parameter_value: value.to_string(),
        apply_method: "immediate".to_string(),
    };

    DBParameterGroup {
        metadata: cluster_meta(stack, stack.resource_name()),
        spec: DBParameterGroupSpec {
            resource_spec: provider_ref(stack),
            for_provider: DBParameterGroupParameters {
                region: stack.spec.region.clone(),
                description: "Engine parameter overrides for managed database instances"
                    .to_string(),
                db_parameter_group_family: format!("{}{major}", stack.spec.database.engine),
                parameters: vec![
                    parameter("log_statement", "ddl"),
                    parameter("log_min_duration_statement", "8000"),
                    parameter("rds.log_retention_period", "10080"),
                ],
                tags: resource_tags(stack, config),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::sample_stack;
    use super::*;
    use crate::provider::DeletionPolicy;

    #[test]
    fn instance_identity_is_deterministic() {
        let stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let first = rds_instance(&stack, &config, "wiki");
        let second = rds_instance(&stack, &config, "wiki");
        assert_eq!(first.metadata.name.as_deref(), Some("wiki-6ba7b810"));
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn instance_wires_groups_and_master_secret() {
        let stack = sample_stack("wiki");
        let instance = rds_instance(&stack, &OperatorConfig::default(), "wiki");
        let params = &instance.spec.for_provider;
        assert_eq!(params.db_subnet_group_name.as_deref(), Some("wiki-6ba7b810"));
        assert_eq!(
            params.db_parameter_group_name.as_deref(),
            Some("wiki-6ba7b810")
        );
        let secret_ref = params.master_password_secret_ref.as_ref().unwrap();
        assert_eq!(secret_ref.secret_ref.name, "wiki-db-master-password");
        assert_eq!(secret_ref.key, "password");
        assert!(params.restore_from.is_none());
        assert!(params.skip_final_snapshot_before_deletion);
    }

    #[test]
    fn snapshot_id_switches_to_restore() {
        let mut stack = sample_stack("wiki");
        stack.spec.database.snapshot_id = Some("rds:snap-1".to_string());
        let instance = rds_instance(&stack, &OperatorConfig::default(), "wiki");
        let restore = instance.spec.for_provider.restore_from.as_ref().unwrap();
        assert_eq!(restore.source, "Snapshot");
        assert_eq!(
            restore.snapshot.as_ref().unwrap().snapshot_identifier.as_deref(),
            Some("rds:snap-1")
        );
    }

    #[test]
    fn empty_snapshot_id_is_not_a_restore() {
        let mut stack = sample_stack("wiki");
        stack.spec.database.snapshot_id = Some(String::new());
        let instance = rds_instance(&stack, &OperatorConfig::default(), "wiki");
        assert!(instance.spec.for_provider.restore_from.is_none());
    }

    #[test]
    fn retain_on_delete_orphans_the_instance() {
        let mut stack = sample_stack("wiki");
        stack.spec.retain_on_delete = true;
        let instance = rds_instance(&stack, &OperatorConfig::default(), "wiki");
        assert_eq!(
            instance.spec.resource_spec.deletion_policy,
            Some(DeletionPolicy::Orphan)
        );
    }

    #[test]
    fn parameter_family_uses_engine_major_version() {
        let stack = sample_stack("wiki");
        let group = db_parameter_group(&stack, &OperatorConfig::default());
        assert_eq!(
            group.spec.for_provider.db_parameter_group_family,
            "postgres14"
        );
        assert_eq!(group.spec.for_provider.parameters.len(), 3);
    }

    #[test]
    fn subnet_group_carries_record_subnets() {
        let stack = sample_stack("wiki");
        let group = db_subnet_group(&stack, &OperatorConfig::default());
        assert_eq!(group.spec.for_provider.subnet_ids.len(), 3);
        assert_eq!(group.metadata.name.as_deref(), Some("wiki-6ba7b810"));
    }
}
