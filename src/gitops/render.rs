//! ApplicationSet manifest rendering
//!
//! Renders the deployment-controller manifest from a template with strict
//! undefined handling, then writes it to a per-record output file the
//! subprocess adapter hands off. Ingress annotations are assembled from
//! operator configuration plus the record's network and hostname.

use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::OperatorConfig;
use crate::crd::AppStack;
use crate::Error;

#[derive(Serialize)]
struct TemplateVars {
    name: String,
    uid: String,
    namespace: String,
    argocd_namespace: String,
    project: String,
    auto_sync: bool,
    apply_out_of_sync_only: bool,
    retain_on_delete: bool,
    helm_chart_repo: String,
    helm_chart_version: String,
    helm_values_git_repo: String,
    helm_values_revision: String,
    values_files: Vec<String>,
    inline_values: String,
    app_hostname: String,
    ingress_annotations: BTreeMap<String, String>,
}

/// Load-balancer and DNS annotations for the rendered ingress
fn ingress_annotations(stack: &AppStack, config: &OperatorConfig) -> BTreeMap<String, String> {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let subnets = stack.spec.network.subnet_ids.join(",");
    let mut alb_tags = vec![format!("service_name={record}"), format!("Name={record}")];
    alb_tags.extend(
        config
            .resource_tags
            .iter()
            .map(|(k, v)| format!("{k}={v}")),
    );

    BTreeMap::from([
        (
            "alb.ingress.kubernetes.io/certificate-arn".to_string(),
            config.ingress_certificate_arn.clone(),
        ),
        (
            "alb.ingress.kubernetes.io/healthcheck-path".to_string(),
            "/status".to_string(),
        ),
        (
            "alb.ingress.kubernetes.io/listen-ports".to_string(),
            r#"[{"HTTP": 80}, {"HTTPS": 443}]"#.to_string(),
        ),
        (
            "alb.ingress.kubernetes.io/scheme".to_string(),
            "internal".to_string(),
        ),
        (
            "alb.ingress.kubernetes.io/ssl-policy".to_string(),
            "ELBSecurityPolicy-FS-1-2-Res-2020-10".to_string(),
        ),
        ("alb.ingress.kubernetes.io/subnets".to_string(), subnets),
        (
            "alb.ingress.kubernetes.io/tags".to_string(),
            alb_tags.join(","),
        ),
        (
            "alb.ingress.kubernetes.io/target-group-attributes".to_string(),
            "stickiness.enabled=true,stickiness.lb_cookie.duration_seconds=43200".to_string(),
        ),
        (
            "alb.ingress.kubernetes.io/target-type".to_string(),
            "ip".to_string(),
        ),
        (
            "external-dns.alpha.kubernetes.io/hostname".to_string(),
            stack.spec.hostname.clone(),
        ),
    ])
}

fn template_vars(stack: &AppStack, config: &OperatorConfig) -> TemplateVars {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let gitops = &stack.spec.gitops;
    TemplateVars {
        name: record.clone(),
        uid: stack.metadata.uid.clone().unwrap_or_default(),
        namespace: record,
        argocd_namespace: gitops.namespace.clone(),
        project: gitops.project.clone(),
        auto_sync: gitops.sync_policy.auto_sync,
        apply_out_of_sync_only: gitops.sync_policy.apply_out_of_sync_only,
        retain_on_delete: gitops.retain_on_delete,
        helm_chart_repo: gitops.helm_chart.repo_url.clone(),
        helm_chart_version: gitops.helm_chart.version.clone(),
        helm_values_git_repo: gitops.helm_values.git_repo.clone(),
        helm_values_revision: gitops.helm_values.git_revision.clone(),
        values_files: gitops.helm_values.values_files.clone(),
        inline_values: gitops.helm_values.value_overrides.clone(),
        app_hostname: stack.spec.hostname.clone(),
        ingress_annotations: ingress_annotations(stack, config),
    }
}

/// Render the ApplicationSet manifest for a record
///
/// Undefined template variables are errors, so a template drifting from
/// the variable set fails the hand-off step instead of producing a
/// half-rendered manifest.
pub fn render_application_set(
    template: &str,
    stack: &AppStack,
    config: &OperatorConfig,
) -> Result<String, Error> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_template("applicationset", template)?;
    let rendered = env
        .get_template("applicationset")?
        .render(Value::from_serialize(&template_vars(stack, config)))?;
    Ok(rendered)
}

/// Per-record output path for the rendered manifest
pub fn manifest_path(config: &OperatorConfig, record: &str) -> PathBuf {
    config
        .manifest_dir
        .join(format!("applicationset-{record}.yaml"))
}

/// Write the rendered manifest to its per-record file
pub async fn write_manifest(
    config: &OperatorConfig,
    record: &str,
    rendered: &str,
) -> Result<PathBuf, Error> {
    let path = manifest_path(config, record);
    tokio::fs::write(&path, rendered)
        .await
        .map_err(|e| Error::gitops("write-manifest", e.to_string()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::fixtures::sample_stack;

    const TEMPLATE: &str = include_str!("../../gitops/applicationset.yaml.tpl");

    #[test]
    fn rendering_is_deterministic() {
        let stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let first = render_application_set(TEMPLATE, &stack, &config).unwrap();
        let second = render_application_set(TEMPLATE, &stack, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rendered_manifest_carries_record_values() {
        let stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let rendered = render_application_set(TEMPLATE, &stack, &config).unwrap();
        assert!(rendered.contains("name: wiki"));
        assert!(rendered.contains("namespace: argocd"));
        assert!(rendered.contains("https://charts.example.com"));
        assert!(rendered.contains("targetRevision: 1.2.3"));
        assert!(rendered.contains("wiki.example.com"));
        assert!(rendered.contains("alb.ingress.kubernetes.io/subnets: \"subnet-a,subnet-b,subnet-c\""));
    }

    #[test]
    fn auto_sync_toggles_the_automated_block() {
        let mut stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let with_sync = render_application_set(TEMPLATE, &stack, &config).unwrap();
        assert!(with_sync.contains("automated:"));

        stack.spec.gitops.sync_policy.auto_sync = false;
        let without_sync = render_application_set(TEMPLATE, &stack, &config).unwrap();
        assert!(!without_sync.contains("automated:"));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let stack = sample_stack("wiki");
        let config = OperatorConfig::default();
        let result = render_application_set("value: {{ not_a_variable }}", &stack, &config);
        assert!(result.is_err());
    }

    #[test]
    fn manifest_path_is_keyed_by_record() {
        let config = OperatorConfig::default();
        assert_eq!(
            manifest_path(&config, "wiki"),
            PathBuf::from("gitops/applicationset-wiki.yaml")
        );
    }
}
