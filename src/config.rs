//! Operator configuration
//!
//! Organizational metadata (resource tags, IAM role ARNs, certificate ARNs)
//! and filesystem paths are configuration inputs, not literals in the
//! materializers. Everything here can be overridden through environment
//! variables at startup; defaults are suitable for development.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration shared by all materializers and the GitOps renderer
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Tags applied to every provider-managed cloud resource
    pub resource_tags: BTreeMap<String, String>,

    /// IAM role ARN annotated onto the credential-reset service account
    pub reset_job_role_arn: String,

    /// ACM certificate ARN for the application ingress
    pub ingress_certificate_arn: String,

    /// Master username for provisioned database instances
    pub db_master_username: String,

    /// Application database username written into the app credentials secret
    pub db_app_username: String,

    /// Container image for the credential-reset job
    pub reset_job_image: String,

    /// Container image for the schema-migration job
    pub migration_job_image: String,

    /// Container image for the NFS server workload
    pub nfs_server_image: String,

    /// Path to the schema-migration change-log payload
    pub changelog_path: PathBuf,

    /// Path to the ApplicationSet manifest template
    pub template_path: PathBuf,

    /// Directory where rendered manifests are written, one file per record
    pub manifest_dir: PathBuf,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            resource_tags: BTreeMap::from([(
                "created_by".to_string(),
                "appstack-operator".to_string(),
            )]),
            reset_job_role_arn: String::new(),
            ingress_certificate_arn: String::new(),
            db_master_username: "postgres".to_string(),
            db_app_username: "app".to_string(),
            reset_job_image: "amazon/aws-cli:2.13.14".to_string(),
            migration_job_image: "liquibase/liquibase:4.21.0".to_string(),
            nfs_server_image: "atlassian/nfs-server-test:2.1".to_string(),
            changelog_path: PathBuf::from("config/migration/changelog.yml"),
            template_path: PathBuf::from("gitops/applicationset.yaml.tpl"),
            manifest_dir: PathBuf::from("gitops"),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// `APPSTACK_RESOURCE_TAGS` is a comma-separated `key=value` list.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(tags) = std::env::var("APPSTACK_RESOURCE_TAGS") {
            cfg.resource_tags = parse_tags(&tags);
        }
        if let Ok(arn) = std::env::var("APPSTACK_RESET_JOB_ROLE_ARN") {
            cfg.reset_job_role_arn = arn;
        }
        if let Ok(arn) = std::env::var("APPSTACK_INGRESS_CERTIFICATE_ARN") {
            cfg.ingress_certificate_arn = arn;
        }
        if let Ok(user) = std::env::var("APPSTACK_DB_MASTER_USERNAME") {
            cfg.db_master_username = user;
        }
        if let Ok(user) = std::env::var("APPSTACK_DB_APP_USERNAME") {
            cfg.db_app_username = user;
        }
        if let Ok(image) = std::env::var("APPSTACK_RESET_JOB_IMAGE") {
            cfg.reset_job_image = image;
        }
        if let Ok(image) = std::env::var("APPSTACK_MIGRATION_JOB_IMAGE") {
            cfg.migration_job_image = image;
        }
        if let Ok(image) = std::env::var("APPSTACK_NFS_SERVER_IMAGE") {
            cfg.nfs_server_image = image;
        }
        if let Ok(path) = std::env::var("APPSTACK_CHANGELOG_PATH") {
            cfg.changelog_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("APPSTACK_TEMPLATE_PATH") {
            cfg.template_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("APPSTACK_MANIFEST_DIR") {
            cfg.manifest_dir = PathBuf::from(dir);
        }

        cfg
    }
}

fn parse_tags(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_list() {
        let tags = parse_tags("team=platform, service_name=appstack,bad");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["team"], "platform");
        assert_eq!(tags["service_name"], "appstack");
    }

    #[test]
    fn default_config_has_master_username() {
        let cfg = OperatorConfig::default();
        assert_eq!(cfg.db_master_username, "postgres");
        assert!(cfg.changelog_path.ends_with("changelog.yml"));
    }
}
