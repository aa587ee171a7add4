//! Store and infrastructure client seams
//!
//! Two traits split the driver's collaborators: [`StoreClient`] covers the
//! in-cluster store (namespaces, secrets, jobs, volumes, status patches)
//! and [`InfraClient`] covers provider-managed resources. Both are mocked
//! in tests and wrapped around a real `kube::Client` in production.
//!
//! Creation is idempotent everywhere: `ensure_*` swallows AlreadyExists,
//! and `get_*` maps NotFound to `None`.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, PersistentVolume, PersistentVolumeClaim, Secret, Service,
    ServiceAccount,
};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use crate::crd::{AppStack, AppStackStatus};
use crate::provider::{
    DBParameterGroup, DBSubnetGroup, FileSystem, MountTarget, RDSInstance, Volume,
    VolumeSnapshot, VolumeSnapshotContent,
};
use crate::Error;

/// Field manager recorded on every write
pub const FIELD_MANAGER: &str = "appstack-controller";

/// In-cluster store operations the driver depends on
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Create the namespace if it does not exist
    async fn ensure_namespace(&self, namespace: &Namespace) -> Result<(), Error>;

    /// Get a secret, None when absent
    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error>;

    /// Create a secret, tolerating a pre-existing one
    async fn create_secret(&self, secret: &Secret) -> Result<(), Error>;

    /// Create or overwrite a secret
    async fn apply_secret(&self, secret: &Secret) -> Result<(), Error>;

    /// Get a config map, None when absent
    async fn get_config_map(&self, name: &str, namespace: &str)
        -> Result<Option<ConfigMap>, Error>;

    /// Create a config map, tolerating a pre-existing one
    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<(), Error>;

    /// Create or overwrite a config map
    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<(), Error>;

    /// Create a service account, tolerating a pre-existing one
    async fn ensure_service_account(&self, account: &ServiceAccount) -> Result<(), Error>;

    /// Create a job, tolerating a pre-existing one
    async fn ensure_job(&self, job: &Job) -> Result<(), Error>;

    /// Get a job, None when absent
    async fn get_job(&self, name: &str, namespace: &str) -> Result<Option<Job>, Error>;

    /// Create a service, tolerating a pre-existing one
    async fn ensure_service(&self, service: &Service) -> Result<(), Error>;

    /// Get a service, None when absent
    async fn get_service(&self, name: &str, namespace: &str) -> Result<Option<Service>, Error>;

    /// Create a stateful set, tolerating a pre-existing one
    async fn ensure_stateful_set(&self, set: &StatefulSet) -> Result<(), Error>;

    /// Get a stateful set, None when absent
    async fn get_stateful_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StatefulSet>, Error>;

    /// Create a persistent volume, tolerating a pre-existing one
    async fn ensure_persistent_volume(&self, volume: &PersistentVolume) -> Result<(), Error>;

    /// Get a persistent volume, None when absent
    async fn get_persistent_volume(&self, name: &str)
        -> Result<Option<PersistentVolume>, Error>;

    /// Create a claim, tolerating a pre-existing one
    async fn ensure_claim(&self, claim: &PersistentVolumeClaim) -> Result<(), Error>;

    /// Get a claim, None when absent
    async fn get_claim(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<PersistentVolumeClaim>, Error>;

    /// Create a snapshot content, tolerating a pre-existing one
    async fn ensure_snapshot_content(&self, content: &VolumeSnapshotContent)
        -> Result<(), Error>;

    /// Create a snapshot, tolerating a pre-existing one
    async fn ensure_snapshot(&self, snapshot: &VolumeSnapshot) -> Result<(), Error>;

    /// Patch the status subresource of a record
    async fn patch_status(&self, name: &str, status: &AppStackStatus) -> Result<(), Error>;
}

/// Provider-managed resource operations the driver depends on
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InfraClient: Send + Sync {
    /// Create a subnet group, tolerating a pre-existing one
    async fn ensure_subnet_group(&self, group: &DBSubnetGroup) -> Result<(), Error>;

    /// Create a parameter group, tolerating a pre-existing one
    async fn ensure_parameter_group(&self, group: &DBParameterGroup) -> Result<(), Error>;

    /// Create a database instance, tolerating a pre-existing one
    async fn ensure_database(&self, instance: &RDSInstance) -> Result<(), Error>;

    /// Get a database instance, None when absent
    async fn get_database(&self, name: &str) -> Result<Option<RDSInstance>, Error>;

    /// Create a managed filesystem, tolerating a pre-existing one
    async fn ensure_filesystem(&self, filesystem: &FileSystem) -> Result<(), Error>;

    /// Get a managed filesystem, None when absent
    async fn get_filesystem(&self, name: &str) -> Result<Option<FileSystem>, Error>;

    /// Create a mount target, tolerating a pre-existing one
    async fn ensure_mount_target(&self, target: &MountTarget) -> Result<(), Error>;

    /// Get a mount target, None when absent
    async fn get_mount_target(&self, name: &str) -> Result<Option<MountTarget>, Error>;

    /// Create a block volume, tolerating a pre-existing one
    async fn ensure_volume(&self, volume: &Volume) -> Result<(), Error>;

    /// Get a block volume, None when absent
    async fn get_volume(&self, name: &str) -> Result<Option<Volume>, Error>;
}

/// Real store client wrapping a kube Client
pub struct StoreClientImpl {
    client: Client,
}

impl StoreClientImpl {
    /// Wrap the given kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn namespace_of<K: Resource>(object: &K) -> String {
    object.meta().namespace.clone().unwrap_or_default()
}

async fn create_idempotent<K>(api: &Api<K>, object: &K) -> Result<(), Error>
where
    K: Resource + Serialize + DeserializeOwned + Clone + Debug,
{
    match api.create(&PostParams::default(), object).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn get_optional<K>(api: &Api<K>, name: &str) -> Result<Option<K>, Error>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    match api.get(name).await {
        Ok(object) => Ok(Some(object)),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn apply<K>(api: &Api<K>, object: &K) -> Result<(), Error>
where
    K: Resource + Serialize + DeserializeOwned + Clone + Debug,
{
    let name = object.meta().name.clone().unwrap_or_default();
    api.patch(
        &name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(object),
    )
    .await?;
    Ok(())
}

impl StoreClientImpl {
    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl StoreClient for StoreClientImpl {
    async fn ensure_namespace(&self, namespace: &Namespace) -> Result<(), Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        create_idempotent(&api, namespace).await
    }

    async fn get_secret(&self, name: &str, namespace: &str) -> Result<Option<Secret>, Error> {
        get_optional(&self.namespaced::<Secret>(namespace), name).await
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(secret)), secret).await
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<(), Error> {
        apply(&self.namespaced(&namespace_of(secret)), secret).await
    }

    async fn get_config_map(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ConfigMap>, Error> {
        get_optional(&self.namespaced::<ConfigMap>(namespace), name).await
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(config_map)), config_map).await
    }

    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<(), Error> {
        apply(&self.namespaced(&namespace_of(config_map)), config_map).await
    }

    async fn ensure_service_account(&self, account: &ServiceAccount) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(account)), account).await
    }

    async fn ensure_job(&self, job: &Job) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(job)), job).await
    }

    async fn get_job(&self, name: &str, namespace: &str) -> Result<Option<Job>, Error> {
        get_optional(&self.namespaced::<Job>(namespace), name).await
    }

    async fn ensure_service(&self, service: &Service) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(service)), service).await
    }

    async fn get_service(&self, name: &str, namespace: &str) -> Result<Option<Service>, Error> {
        get_optional(&self.namespaced::<Service>(namespace), name).await
    }

    async fn ensure_stateful_set(&self, set: &StatefulSet) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(set)), set).await
    }

    async fn get_stateful_set(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<StatefulSet>, Error> {
        get_optional(&self.namespaced::<StatefulSet>(namespace), name).await
    }

    async fn ensure_persistent_volume(&self, volume: &PersistentVolume) -> Result<(), Error> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        create_idempotent(&api, volume).await
    }

    async fn get_persistent_volume(
        &self,
        name: &str,
    ) -> Result<Option<PersistentVolume>, Error> {
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        get_optional(&api, name).await
    }

    async fn ensure_claim(&self, claim: &PersistentVolumeClaim) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(claim)), claim).await
    }

    async fn get_claim(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<PersistentVolumeClaim>, Error> {
        get_optional(&self.namespaced::<PersistentVolumeClaim>(namespace), name).await
    }

    async fn ensure_snapshot_content(
        &self,
        content: &VolumeSnapshotContent,
    ) -> Result<(), Error> {
        let api: Api<VolumeSnapshotContent> = Api::all(self.client.clone());
        create_idempotent(&api, content).await
    }

    async fn ensure_snapshot(&self, snapshot: &VolumeSnapshot) -> Result<(), Error> {
        create_idempotent(&self.namespaced(&namespace_of(snapshot)), snapshot).await
    }

    async fn patch_status(&self, name: &str, status: &AppStackStatus) -> Result<(), Error> {
        let api: Api<AppStack> = Api::all(self.client.clone());
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Real infrastructure client wrapping a kube Client
///
/// Provider resources are cluster-scoped custom resources, so every call
/// goes through an all-namespaces Api.
pub struct InfraClientImpl {
    client: Client,
}

impl InfraClientImpl {
    /// Wrap the given kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn all<K>(&self) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::ClusterResourceScope>,
        K::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl InfraClient for InfraClientImpl {
    async fn ensure_subnet_group(&self, group: &DBSubnetGroup) -> Result<(), Error> {
        create_idempotent(&self.all(), group).await
    }

    async fn ensure_parameter_group(&self, group: &DBParameterGroup) -> Result<(), Error> {
        create_idempotent(&self.all(), group).await
    }

    async fn ensure_database(&self, instance: &RDSInstance) -> Result<(), Error> {
        create_idempotent(&self.all(), instance).await
    }

    async fn get_database(&self, name: &str) -> Result<Option<RDSInstance>, Error> {
        get_optional(&self.all(), name).await
    }

    async fn ensure_filesystem(&self, filesystem: &FileSystem) -> Result<(), Error> {
        create_idempotent(&self.all(), filesystem).await
    }

    async fn get_filesystem(&self, name: &str) -> Result<Option<FileSystem>, Error> {
        get_optional(&self.all(), name).await
    }

    async fn ensure_mount_target(&self, target: &MountTarget) -> Result<(), Error> {
        create_idempotent(&self.all(), target).await
    }

    async fn get_mount_target(&self, name: &str) -> Result<Option<MountTarget>, Error> {
        get_optional(&self.all(), name).await
    }

    async fn ensure_volume(&self, volume: &Volume) -> Result<(), Error> {
        create_idempotent(&self.all(), volume).await
    }

    async fn get_volume(&self, name: &str) -> Result<Option<Volume>, Error> {
        get_optional(&self.all(), name).await
    }
}
