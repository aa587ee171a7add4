//! Status projectors
//!
//! Pure accessors over fetched objects. Each projects one nested
//! provider-observed field; absent fields project to an empty string or
//! zero rather than an error, so callers branch on values only.

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Secret, Service};

use crate::provider::{FileSystem, MountTarget, RDSInstance, Volume};

/// Provider lifecycle phase of a database instance
pub fn database_phase(instance: &RDSInstance) -> String {
    instance
        .status
        .as_ref()
        .map(|s| s.at_provider.db_instance_status.clone())
        .unwrap_or_default()
}

/// Published endpoint address of a database instance
pub fn database_endpoint(instance: &RDSInstance) -> String {
    instance
        .status
        .as_ref()
        .and_then(|s| s.at_provider.endpoint.as_ref())
        .and_then(|e| e.address.clone())
        .unwrap_or_default()
}

/// Assigned identifier of a managed filesystem
pub fn filesystem_id(filesystem: &FileSystem) -> String {
    filesystem
        .status
        .as_ref()
        .and_then(|s| s.at_provider.file_system_id.clone())
        .unwrap_or_default()
}

/// Lifecycle state of a mount target
pub fn mount_target_state(target: &MountTarget) -> String {
    target
        .status
        .as_ref()
        .and_then(|s| s.at_provider.life_cycle_state.clone())
        .unwrap_or_default()
}

/// Assigned identifier of a block volume
pub fn volume_id(volume: &Volume) -> String {
    volume
        .status
        .as_ref()
        .and_then(|s| s.at_provider.volume_id.clone())
        .unwrap_or_default()
}

/// Number of pods a job has run to completion
pub fn job_succeeded(job: &Job) -> i32 {
    job.status
        .as_ref()
        .and_then(|s| s.succeeded)
        .unwrap_or_default()
}

/// Number of ready replicas in a stateful set
pub fn stateful_set_ready(set: &StatefulSet) -> i32 {
    set.status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or_default()
}

/// Cluster IP assigned to a service
pub fn service_cluster_ip(service: &Service) -> String {
    service
        .spec
        .as_ref()
        .and_then(|s| s.cluster_ip.clone())
        .unwrap_or_default()
}

/// Binding phase of a claim
pub fn claim_phase(claim: &PersistentVolumeClaim) -> String {
    claim
        .status
        .as_ref()
        .and_then(|s| s.phase.clone())
        .unwrap_or_default()
}

/// Name of the volume a claim is bound to
pub fn claim_volume_name(claim: &PersistentVolumeClaim) -> String {
    claim
        .spec
        .as_ref()
        .and_then(|s| s.volume_name.clone())
        .unwrap_or_default()
}

/// CSI handle backing a persistent volume
pub fn volume_handle(volume: &PersistentVolume) -> String {
    volume
        .spec
        .as_ref()
        .and_then(|s| s.csi.as_ref())
        .map(|csi| csi.volume_handle.clone())
        .unwrap_or_default()
}

/// Decoded value of a secret key, None when the key is absent
///
/// Reads the server-populated binary data first, then falls back to
/// stringData for objects that never round-tripped the server.
pub fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    if let Some(data) = secret.data.as_ref().and_then(|d| d.get(key)) {
        return String::from_utf8(data.0.clone()).ok();
    }
    secret
        .string_data
        .as_ref()
        .and_then(|d| d.get(key))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        Endpoint, FileSystemSpec, MountTargetSpec, RDSInstanceObservation, RDSInstanceSpec,
        RDSInstanceStatus, VolumeObservation, VolumeSpec, VolumeStatus,
    };
    use k8s_openapi::api::batch::v1::JobStatus;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    #[test]
    fn absent_status_projects_to_empty() {
        let instance = RDSInstance::new("db", RDSInstanceSpec::default());
        assert_eq!(database_phase(&instance), "");
        assert_eq!(database_endpoint(&instance), "");
        assert_eq!(volume_id(&Volume::new("vol", VolumeSpec::default())), "");
        assert_eq!(
            filesystem_id(&FileSystem::new("fs", FileSystemSpec::default())),
            ""
        );
        assert_eq!(
            mount_target_state(&MountTarget::new("mt", MountTargetSpec::default())),
            ""
        );
        assert_eq!(job_succeeded(&Job::default()), 0);
        assert_eq!(stateful_set_ready(&StatefulSet::default()), 0);
        assert_eq!(service_cluster_ip(&Service::default()), "");
        assert_eq!(claim_phase(&PersistentVolumeClaim::default()), "");
    }

    #[test]
    fn populated_status_projects_the_value() {
        let mut instance = RDSInstance::new("db", RDSInstanceSpec::default());
        instance.status = Some(RDSInstanceStatus {
            at_provider: RDSInstanceObservation {
                db_instance_status: "available".to_string(),
                endpoint: Some(Endpoint {
                    address: Some("db.internal".to_string()),
                }),
            },
        });
        assert_eq!(database_phase(&instance), "available");
        assert_eq!(database_endpoint(&instance), "db.internal");

        let mut volume = Volume::new("vol", VolumeSpec::default());
        volume.status = Some(VolumeStatus {
            at_provider: VolumeObservation {
                volume_id: Some("vol-9".to_string()),
            },
        });
        assert_eq!(volume_id(&volume), "vol-9");

        let mut job = Job::default();
        job.status = Some(JobStatus {
            succeeded: Some(1),
            ..Default::default()
        });
        assert_eq!(job_succeeded(&job), 1);
    }

    #[test]
    fn secret_value_prefers_binary_data() {
        let mut secret = Secret::default();
        secret.data = Some(BTreeMap::from([(
            "password".to_string(),
            ByteString(b"from-data".to_vec()),
        )]));
        secret.string_data = Some(BTreeMap::from([(
            "password".to_string(),
            "from-string".to_string(),
        )]));
        assert_eq!(secret_value(&secret, "password").as_deref(), Some("from-data"));
        assert_eq!(secret_value(&secret, "missing"), None);
    }
}
