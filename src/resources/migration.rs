//! Migration and credential-reset job materializers
//!
//! Two one-shot jobs run against a freshly provisioned database: a
//! credential-reset job that forces the master password onto a restored
//! instance, and a schema migration job that applies the changelog with
//! the properties secret flattened into a defaults file.

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, EnvVar, EnvVarSource, PodSpec, PodTemplateSpec,
    SecretKeySelector, SecretVolumeSource, ServiceAccount, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use crate::config::OperatorConfig;
use crate::crd::AppStack;

use super::{master_secret_name, migration_secret_name, namespaced_meta};

/// Key the changelog document is stored under in its config map
pub const CHANGELOG_KEY: &str = "changelog.yml";

fn changelog_config_map_name(record: &str) -> String {
    format!("{record}-migration-changelog")
}

fn reset_service_account_name(record: &str) -> String {
    format!("{record}-db-reset-sa")
}

fn owner_labels(record: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("owner".to_string(), record.to_string())])
}

fn secret_env(name: &str, secret: String, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret,
                key: key.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Config map holding the changelog document the migration job applies
pub fn changelog_config_map(stack: &AppStack, namespace: &str, changelog: &str) -> ConfigMap {
    let record = stack.metadata.name.clone().unwrap_or_default();
    ConfigMap {
        metadata: namespaced_meta(stack, changelog_config_map_name(&record), namespace),
        data: Some(BTreeMap::from([(
            CHANGELOG_KEY.to_string(),
            changelog.to_string(),
        )])),
        ..Default::default()
    }
}

/// Service account the credential-reset job runs under
///
/// The cloud-side role is granted through the annotation configured on
/// the operator.
pub fn reset_service_account(stack: &AppStack, config: &OperatorConfig, namespace: &str) -> ServiceAccount {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let mut meta = namespaced_meta(stack, reset_service_account_name(&record), namespace);
    meta.annotations = Some(BTreeMap::from([(
        "eks.amazonaws.com/role-arn".to_string(),
        config.reset_job_role_arn.clone(),
    )]));
    ServiceAccount {
        metadata: meta,
        ..Default::default()
    }
}

/// One-shot job resetting the master password on a restored instance
///
/// Restored instances keep the snapshot's credentials, which the record's
/// freshly generated master password does not match until this runs.
pub fn reset_credentials_job(stack: &AppStack, config: &OperatorConfig, namespace: &str) -> Job {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let command = format!(
        "aws rds modify-db-instance --db-instance-identifier={} --master-user-password $PGPASSWORD --region {} --apply-immediately",
        stack.resource_name(),
        stack.spec.region,
    );
    Job {
        metadata: namespaced_meta(stack, format!("{record}-reset-db-credentials"), namespace),
        spec: Some(JobSpec {
            backoff_limit: Some(20),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(owner_labels(&record)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(reset_service_account_name(&record)),
                    containers: vec![Container {
                        name: "reset-credentials".to_string(),
                        image: Some(config.reset_job_image.clone()),
                        command: Some(vec!["/bin/sh".to_string()]),
                        args: Some(vec!["-c".to_string(), command]),
                        env: Some(vec![secret_env(
                            "PGPASSWORD",
                            master_secret_name(&record),
                            "password",
                        )]),
                        ..Default::default()
                    }],
                    restart_policy: Some("Never".to_string()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// One-shot job applying the schema changelog
///
/// Mounts the properties secret as individual files, flattens them into a
/// defaults file and runs the migration entrypoint against the instance.
pub fn migration_job(stack: &AppStack, config: &OperatorConfig, namespace: &str) -> Job {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let properties = migration_secret_name(&record);
    let script = "cd /liquibase/changelog/properties; grep '' * | sed 's/:/: /1' > /liquibase/liquibase.properties; cd /liquibase; ./docker-entrypoint.sh --defaultsFile=liquibase.properties update;";
    Job {
        metadata: namespaced_meta(stack, format!("{record}-schema-migration"), namespace),
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(owner_labels(&record)),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    volumes: Some(vec![
                        Volume {
                            name: "migration-properties".to_string(),
                            secret: Some(SecretVolumeSource {
                                secret_name: Some(properties.clone()),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                        Volume {
                            name: "migration-changelog".to_string(),
                            config_map: Some(ConfigMapVolumeSource {
                                name: changelog_config_map_name(&record),
                                ..Default::default()
                            }),
                            ..Default::default()
                        },
                    ]),
                    containers: vec![Container {
                        name: format!("{record}-migration"),
                        image: Some(config.migration_job_image.clone()),
                        command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
                        args: Some(vec![script.to_string()]),
                        env: Some(vec![
                            secret_env("PGPASSWORD", properties.clone(), "password"),
                            secret_env("JDBC_URL", properties, "url"),
                        ]),
                        volume_mounts: Some(vec![
                            VolumeMount {
                                name: "migration-properties".to_string(),
                                mount_path: "/liquibase/changelog/properties".to_string(),
                                ..Default::default()
                            },
                            VolumeMount {
                                name: "migration-changelog".to_string(),
                                mount_path: format!("/liquibase/changelog/{CHANGELOG_KEY}"),
                                sub_path: Some(CHANGELOG_KEY.to_string()),
                                ..Default::default()
                            },
                        ]),
                        ..Default::default()
                    }],
                    restart_policy: Some("Never".to_string()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::sample_stack;
    use super::*;

    #[test]
    fn reset_job_targets_the_materialized_instance() {
        let stack = sample_stack("wiki");
        let job = reset_credentials_job(&stack, &OperatorConfig::default(), "wiki");
        assert_eq!(
            job.metadata.name.as_deref(),
            Some("wiki-reset-db-credentials")
        );
        let pod = job.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.service_account_name.as_deref(), Some("wiki-db-reset-sa"));
        let args = pod.containers[0].args.as_ref().unwrap();
        assert!(args[1].contains("--db-instance-identifier=wiki-6ba7b810"));
        assert!(args[1].contains("--region ap-southeast-2"));
    }

    #[test]
    fn reset_job_reads_master_password_from_secret() {
        let stack = sample_stack("wiki");
        let job = reset_credentials_job(&stack, &OperatorConfig::default(), "wiki");
        let pod = job.spec.unwrap().template.spec.unwrap();
        let env = &pod.containers[0].env.as_ref().unwrap()[0];
        assert_eq!(env.name, "PGPASSWORD");
        let secret_ref = env
            .value_from
            .as_ref()
            .unwrap()
            .secret_key_ref
            .as_ref()
            .unwrap();
        assert_eq!(secret_ref.name, "wiki-db-master-password");
    }

    #[test]
    fn migration_job_mounts_properties_and_changelog() {
        let stack = sample_stack("wiki");
        let job = migration_job(&stack, &OperatorConfig::default(), "wiki");
        assert_eq!(job.metadata.name.as_deref(), Some("wiki-schema-migration"));
        let pod = job.spec.unwrap().template.spec.unwrap();
        let mounts = pod.containers[0].volume_mounts.as_ref().unwrap();
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[1].sub_path.as_deref(), Some("changelog.yml"));
        assert_eq!(pod.restart_policy.as_deref(), Some("Never"));
    }

    #[test]
    fn changelog_config_map_wraps_the_document() {
        let stack = sample_stack("wiki");
        let cm = changelog_config_map(&stack, "wiki", "databaseChangeLog: []");
        assert_eq!(
            cm.metadata.name.as_deref(),
            Some("wiki-migration-changelog")
        );
        assert_eq!(cm.data.unwrap()[CHANGELOG_KEY], "databaseChangeLog: []");
    }

    #[test]
    fn service_account_carries_the_configured_role() {
        let stack = sample_stack("wiki");
        let mut config = OperatorConfig::default();
        config.reset_job_role_arn = "arn:aws:iam::1:role/reset".to_string();
        let sa = reset_service_account(&stack, &config, "wiki");
        assert_eq!(
            sa.metadata.annotations.unwrap()["eks.amazonaws.com/role-arn"],
            "arn:aws:iam::1:role/reset"
        );
    }
}
