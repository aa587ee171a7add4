//! Credential secret materializers
//!
//! Three secrets per record: the master password the database instance is
//! created with, the application user credentials handed to the deployed
//! app, and the migration properties file consumed by the schema
//! migration job. Secret material is generated by the caller so the
//! builders themselves stay deterministic.

use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;

use crate::config::OperatorConfig;
use crate::crd::AppStack;

use super::namespaced_meta;

/// Name of the master-password secret for `record`
pub fn master_secret_name(record: &str) -> String {
    format!("{record}-db-master-password")
}

/// Name of the application credentials secret for `record`
pub fn app_secret_name(record: &str) -> String {
    format!("{record}-database-credentials")
}

/// Name of the migration properties secret for `record`
pub fn migration_secret_name(record: &str) -> String {
    format!("{record}-migration-properties")
}

fn secret(stack: &AppStack, name: String, namespace: &str, data: BTreeMap<String, String>) -> Secret {
    Secret {
        metadata: namespaced_meta(stack, name, namespace),
        string_data: Some(data),
        ..Default::default()
    }
}

/// Master password the database instance is provisioned with
pub fn master_password_secret(stack: &AppStack, namespace: &str, password: &str) -> Secret {
    let record = stack.metadata.name.clone().unwrap_or_default();
    secret(
        stack,
        master_secret_name(&record),
        namespace,
        BTreeMap::from([("password".to_string(), password.to_string())]),
    )
}

/// Application user credentials, including the assembled JDBC URL
pub fn app_credentials_secret(
    stack: &AppStack,
    config: &OperatorConfig,
    namespace: &str,
    hostname: &str,
    password: &str,
) -> Secret {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let user = &config.db_app_username;
    secret(
        stack,
        app_secret_name(&record),
        namespace,
        BTreeMap::from([
            ("username".to_string(), user.clone()),
            ("password".to_string(), password.to_string()),
            (
                "jdbcUrl".to_string(),
                format!("jdbc:postgresql://{hostname}/{user}"),
            ),
        ]),
    )
}

/// Properties file material for the schema migration job
///
/// Rendered key-by-key; the migration job flattens these entries into a
/// liquibase properties file inside its container.
pub fn migration_properties_secret(
    stack: &AppStack,
    config: &OperatorConfig,
    namespace: &str,
    hostname: &str,
    master_password: &str,
    app_password: &str,
    readonly_password: &str,
) -> Secret {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let app_user = &config.db_app_username;
    secret(
        stack,
        migration_secret_name(&record),
        namespace,
        BTreeMap::from([
            ("username".to_string(), config.db_master_username.clone()),
            ("password".to_string(), master_password.to_string()),
            (
                "url".to_string(),
                format!("jdbc:postgresql://{hostname}/{}", config.db_master_username),
            ),
            ("hostname".to_string(), hostname.to_string()),
            ("changeLogFile".to_string(), "changelog.yml".to_string()),
            ("classpath".to_string(), "changelog".to_string()),
            ("parameter.appUsername".to_string(), app_user.clone()),
            (
                "parameter.appRoUsername".to_string(),
                format!("{app_user}-ro"),
            ),
            ("parameter.appPassword".to_string(), app_password.to_string()),
            (
                "parameter.appRoPassword".to_string(),
                readonly_password.to_string(),
            ),
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::sample_stack;
    use super::*;

    #[test]
    fn master_secret_holds_only_the_password() {
        let stack = sample_stack("wiki");
        let secret = master_password_secret(&stack, "wiki", "s3cret");
        assert_eq!(
            secret.metadata.name.as_deref(),
            Some("wiki-db-master-password")
        );
        assert_eq!(secret.metadata.namespace.as_deref(), Some("wiki"));
        let data = secret.string_data.unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["password"], "s3cret");
    }

    #[test]
    fn app_secret_assembles_the_jdbc_url() {
        let stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let secret = app_credentials_secret(&stack, &config, "wiki", "db.internal", "pw");
        let data = secret.string_data.unwrap();
        assert_eq!(data["username"], "app");
        assert_eq!(data["jdbcUrl"], "jdbc:postgresql://db.internal/app");
    }

    #[test]
    fn migration_secret_carries_properties_entries() {
        let stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let secret =
            migration_properties_secret(&stack, &config, "wiki", "db.internal", "m", "a", "r");
        let data = secret.string_data.unwrap();
        assert_eq!(data["username"], "postgres");
        assert_eq!(data["url"], "jdbc:postgresql://db.internal/postgres");
        assert_eq!(data["changeLogFile"], "changelog.yml");
        assert_eq!(data["parameter.appUsername"], "app");
        assert_eq!(data["parameter.appRoUsername"], "app-ro");
        assert_eq!(data["parameter.appPassword"], "a");
        assert_eq!(data["parameter.appRoPassword"], "r");
    }

    #[test]
    fn secrets_are_deterministic_for_fixed_material() {
        let stack = sample_stack("wiki");
        let a = master_password_secret(&stack, "wiki", "fixed");
        let b = master_password_secret(&stack, "wiki", "fixed");
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }
}
