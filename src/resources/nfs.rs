//! In-cluster NFS server materializers
//!
//! The block-volume restore strategy serves the restored volume over NFS
//! so the application still mounts a shared filesystem. The server is a
//! single-replica stateful set pinned to the volume's availability zone,
//! fronted by a fixed-port service.

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec, StatefulSetUpdateStrategy};
use k8s_openapi::api::core::v1::{
    Affinity, Capabilities, Container, ContainerPort, ExecAction, NodeAffinity, NodeSelector,
    NodeSelectorRequirement, NodeSelectorTerm, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Probe, SecurityContext, Service, ServicePort, ServiceSpec, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

use crate::config::OperatorConfig;
use crate::crd::AppStack;

use super::namespaced_meta;

/// Port the server exports on
pub const NFS_PORT: i32 = 2049;

/// Mount path the exported volume is served from
pub const NFS_EXPORT_PATH: &str = "/srv/nfs";

/// Name of the server's service, stateful set and backing claim
pub fn nfs_server_name(record: &str) -> String {
    format!("{record}-nfs-server")
}

fn selector_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), "nfs-server".to_string())])
}

/// Cluster-IP service fronting the NFS server
pub fn nfs_server_service(stack: &AppStack, namespace: &str) -> Service {
    let record = stack.metadata.name.clone().unwrap_or_default();
    Service {
        metadata: namespaced_meta(stack, nfs_server_name(&record), namespace),
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some("nfs".to_string()),
                protocol: Some("TCP".to_string()),
                port: NFS_PORT,
                ..Default::default()
            }]),
            selector: Some(selector_labels()),
            type_: Some("ClusterIP".to_string()),
            ..Default::default()
        }),
        status: None,
    }
}

/// Zone node-affinity terms matching the restored volume's placement
pub fn zone_affinity_terms(stack: &AppStack) -> Vec<NodeSelectorTerm> {
    let zone_suffix = stack
        .spec
        .shared_fs
        .ebs
        .as_ref()
        .map(|ebs| ebs.availability_zone.clone())
        .unwrap_or_default();
    vec![NodeSelectorTerm {
        match_expressions: Some(vec![
            NodeSelectorRequirement {
                key: "topology.kubernetes.io/zone".to_string(),
                operator: "In".to_string(),
                values: Some(vec![format!("{}{zone_suffix}", stack.spec.region)]),
            },
            NodeSelectorRequirement {
                key: "topology.kubernetes.io/region".to_string(),
                operator: "In".to_string(),
                values: Some(vec![stack.spec.region.clone()]),
            },
        ]),
        ..Default::default()
    }]
}

/// Single-replica NFS server backed by the restored volume's claim
///
/// The pod must land in the volume's zone, so scheduling requires the
/// same zone and region labels the volume is pinned to.
pub fn nfs_server_stateful_set(
    stack: &AppStack,
    config: &OperatorConfig,
    namespace: &str,
) -> StatefulSet {
    let record = stack.metadata.name.clone().unwrap_or_default();
    let name = nfs_server_name(&record);
    StatefulSet {
        metadata: namespaced_meta(stack, &name, namespace),
        spec: Some(StatefulSetSpec {
            service_name: Some("nfs-server".to_string()),
            replicas: Some(1),
            update_strategy: Some(StatefulSetUpdateStrategy {
                type_: Some("RollingUpdate".to_string()),
                ..Default::default()
            }),
            selector: LabelSelector {
                match_labels: Some(selector_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector_labels()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    termination_grace_period_seconds: Some(0),
                    affinity: Some(Affinity {
                        node_affinity: Some(NodeAffinity {
                            required_during_scheduling_ignored_during_execution: Some(
                                NodeSelector {
                                    node_selector_terms: zone_affinity_terms(stack),
                                },
                            ),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    volumes: Some(vec![Volume {
                        name: "data".to_string(),
                        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                            claim_name: name.clone(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    containers: vec![Container {
                        name: "nfs-server".to_string(),
                        image: Some(config.nfs_server_image.clone()),
                        security_context: Some(SecurityContext {
                            capabilities: Some(Capabilities {
                                add: Some(vec![
                                    "DAC_READ_SEARCH".to_string(),
                                    "SYS_RESOURCE".to_string(),
                                ]),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        ports: Some(vec![ContainerPort {
                            name: Some("nfs".to_string()),
                            container_port: NFS_PORT,
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        volume_mounts: Some(vec![VolumeMount {
                            name: "data".to_string(),
                            mount_path: NFS_EXPORT_PATH.to_string(),
                            ..Default::default()
                        }]),
                        readiness_probe: Some(Probe {
                            exec: Some(ExecAction {
                                command: Some(vec![
                                    "/usr/local/bin/docker-entrypoint.sh".to_string(),
                                    "healthcheck".to_string(),
                                ]),
                            }),
                            initial_delay_seconds: Some(5),
                            period_seconds: Some(1),
                            failure_threshold: Some(30),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
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
    use super::super::fixtures::stack_with_ebs;
    use super::*;

    #[test]
    fn service_exposes_the_nfs_port() {
        let stack = stack_with_ebs("wiki");
        let svc = nfs_server_service(&stack, "wiki");
        assert_eq!(svc.metadata.name.as_deref(), Some("wiki-nfs-server"));
        let spec = svc.spec.unwrap();
        assert_eq!(spec.ports.unwrap()[0].port, 2049);
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
    }

    #[test]
    fn server_is_pinned_to_the_volume_zone() {
        let stack = stack_with_ebs("wiki");
        let sts = nfs_server_stateful_set(&stack, &OperatorConfig::default(), "wiki");
        let pod = sts.spec.unwrap().template.spec.unwrap();
        let terms = pod
            .affinity
            .unwrap()
            .node_affinity
            .unwrap()
            .required_during_scheduling_ignored_during_execution
            .unwrap()
            .node_selector_terms;
        let exprs = terms[0].match_expressions.as_ref().unwrap();
        assert_eq!(
            exprs[0].values.as_ref().unwrap()[0],
            "ap-southeast-2a"
        );
        assert_eq!(exprs[1].values.as_ref().unwrap()[0], "ap-southeast-2");
    }

    #[test]
    fn server_mounts_the_restored_claim() {
        let stack = stack_with_ebs("wiki");
        let sts = nfs_server_stateful_set(&stack, &OperatorConfig::default(), "wiki");
        let spec = sts.spec.unwrap();
        assert_eq!(spec.replicas, Some(1));
        let pod = spec.template.spec.unwrap();
        let claim = pod.volumes.unwrap()[0]
            .persistent_volume_claim
            .as_ref()
            .unwrap()
            .claim_name
            .clone();
        assert_eq!(claim, "wiki-nfs-server");
        assert_eq!(
            pod.containers[0].volume_mounts.as_ref().unwrap()[0].mount_path,
            "/srv/nfs"
        );
    }
}
