//! AppStack convergence driver
//!
//! One reconcile invocation walks a fixed step pipeline: materialize and
//! ensure dependent resources, observe their provider-reported state, and
//! fold that state back into the record's status. Every step either
//! advances, retries after a delay (expected-pending observation), or
//! fails with a requeue hint consumed by [`error_policy`]. Invocations
//! carry no state between each other; completed steps reduce to cheap
//! existence checks on the next pass.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::{Client, ResourceExt};
use tracing::{debug, error, info, instrument, warn};

use crate::config::OperatorConfig;
use crate::crd::{AppStack, EbsParams, EfsParams, FsxParams, FsStrategy};
use crate::credentials::{generate_password, DEFAULT_PASSWORD_LENGTH};
use crate::gitops::{self, GitOpsClient, Kubectl};
use crate::resources;
use crate::resources::CHANGELOG_KEY;
use crate::Error;

use super::client::{InfraClient, InfraClientImpl, StoreClient, StoreClientImpl};
use super::project;
use super::status::StatusWriter;

/// Requeue once the record has fully converged
const STEADY_STATE_REQUEUE: Duration = Duration::from_secs(300);
/// Backoff after a failed provisioning write
const PROVISION_FAILED: Duration = Duration::from_secs(60);
/// Poll while the database instance is not yet available
const DATABASE_PENDING: Duration = Duration::from_secs(30);
/// Poll while a just-created object or identifier is not visible yet
const NOT_VISIBLE: Duration = Duration::from_secs(5);
/// Poll while the database endpoint is unpublished
const ENDPOINT_PENDING: Duration = Duration::from_secs(10);
/// Backoff after a failed job submission
const JOB_FAILED: Duration = Duration::from_secs(300);
/// Backoff after a failed job observation
const JOB_OBSERVE_FAILED: Duration = Duration::from_secs(30);
/// Poll while a one-shot job has not completed
const JOB_PENDING: Duration = Duration::from_secs(5);
/// Backoff when the changelog payload cannot be read; an operator
/// deployment problem, not a transient one
const CHANGELOG_UNREADABLE: Duration = Duration::from_secs(600);
/// Backoff after a failed filesystem provisioning write
const FILESYSTEM_FAILED: Duration = Duration::from_secs(300);
/// Poll while a mount target is not yet available
const MOUNT_TARGET_PENDING: Duration = Duration::from_secs(10);
/// Backoff after a failed changelog creation
const CHANGELOG_CREATE_FAILED: Duration = Duration::from_secs(10);
/// Poll while a claim or serving workload is not yet bound/ready
const BINDING_PENDING: Duration = Duration::from_secs(30);
/// Poll while the NFS service has no cluster IP
const CLUSTER_IP_PENDING: Duration = Duration::from_secs(30);
/// Backoff after a failed volume binding write
const BINDING_FAILED: Duration = Duration::from_secs(30);
/// Backoff after a failed manifest render or hand-off
const HANDOFF_FAILED: Duration = Duration::from_secs(60);
/// Backoff after a failed application phase query
const APP_QUERY_FAILED: Duration = Duration::from_secs(300);

/// Result of one pipeline step
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The step's postcondition holds; evaluate the next step
    Advance,
    /// Expected-pending observation; requeue the whole pipeline
    Retry(Duration),
}

/// Readiness of the database instance after observation
enum DatabaseReadiness {
    Pending(Duration),
    Ready { endpoint: String },
}

macro_rules! advance {
    ($outcome:expr) => {
        if let Outcome::Retry(delay) = $outcome {
            return Ok(Action::requeue(delay));
        }
    };
}

/// Shared state for the controller
pub struct Context {
    /// In-cluster store operations
    pub store: Arc<dyn StoreClient>,
    /// Provider-managed resource operations
    pub infra: Arc<dyn InfraClient>,
    /// Deployment-controller hand-off
    pub gitops: Arc<dyn GitOpsClient>,
    /// Operator configuration
    pub config: OperatorConfig,
}

impl Context {
    /// Build a context around a real kube client
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        Self {
            store: Arc::new(StoreClientImpl::new(client.clone())),
            infra: Arc::new(InfraClientImpl::new(client)),
            gitops: Arc::new(Kubectl),
            config,
        }
    }

    /// Build a context from mock collaborators
    #[cfg(test)]
    pub fn for_testing(
        store: Arc<dyn StoreClient>,
        infra: Arc<dyn InfraClient>,
        gitops: Arc<dyn GitOpsClient>,
        config: OperatorConfig,
    ) -> Self {
        Self {
            store,
            infra,
            gitops,
            config,
        }
    }
}

/// Reconcile one AppStack record
#[instrument(skip(stack, ctx), fields(record = %stack.name_any()))]
pub async fn reconcile(stack: Arc<AppStack>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = stack.name_any();
    info!("reconciling record");

    // Validation failures need a spec change, not a requeue loop
    if let Err(e) = stack.spec.validate(&name) {
        warn!(error = %e, "spec validation failed, waiting for a spec change");
        return Ok(Action::await_change());
    }

    // Namespaced dependents live in a namespace named after the record
    let namespace = name.clone();
    let mut status = StatusWriter::new(ctx.store.clone(), &stack);

    ensure_namespace(&stack, &ctx).await?;
    ensure_database_placement(&stack, &ctx).await?;
    ensure_credentials(&stack, &ctx, &namespace).await?;
    ensure_database(&stack, &ctx, &namespace).await?;

    let endpoint = match observe_database(&stack, &ctx, &mut status).await? {
        DatabaseReadiness::Pending(delay) => return Ok(Action::requeue(delay)),
        DatabaseReadiness::Ready { endpoint } => endpoint,
    };
    refresh_connection_secrets(&stack, &ctx, &namespace, &endpoint).await?;
    status.database_endpoint(&endpoint).await?;

    advance!(run_reset_job(&stack, &ctx, &namespace, &mut status).await?);
    ensure_changelog(&stack, &ctx, &namespace).await?;
    advance!(run_migration_job(&stack, &ctx, &namespace, &mut status).await?);

    let shared_fs = match stack.spec.shared_fs.strategy() {
        FsStrategy::RestoreBlockVolume(ebs) => {
            restore_block_volume(&stack, &ctx, &namespace, ebs, &mut status).await?
        }
        FsStrategy::RestoreFilesystemSnapshot(fsx) => {
            restore_filesystem_snapshot(&stack, &ctx, &namespace, fsx, &mut status).await?
        }
        FsStrategy::NewFilesystem(efs) => {
            provision_new_filesystem(&stack, &ctx, &namespace, efs, &mut status).await?
        }
    };
    advance!(shared_fs);

    hand_off_manifest(&stack, &ctx).await?;
    observe_application(&stack, &ctx, &mut status).await?;

    info!("record converged");
    Ok(Action::requeue(STEADY_STATE_REQUEUE))
}

/// Requeue failed records after the error's hinted delay
pub fn error_policy(stack: Arc<AppStack>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!(?error, record = %stack.name_any(), "reconciliation failed");
    Action::requeue(error.retry_after())
}

async fn ensure_namespace(stack: &AppStack, ctx: &Context) -> Result<(), Error> {
    ctx.store
        .ensure_namespace(&resources::namespace(stack))
        .await
        .map_err(|e| e.with_retry("ensure-namespace", PROVISION_FAILED))
}

async fn ensure_database_placement(stack: &AppStack, ctx: &Context) -> Result<(), Error> {
    let fail = |e: Error| e.with_retry("ensure-database-placement", PROVISION_FAILED);
    ctx.infra
        .ensure_subnet_group(&resources::db_subnet_group(stack, &ctx.config))
        .await
        .map_err(fail)?;
    ctx.infra
        .ensure_parameter_group(&resources::db_parameter_group(stack, &ctx.config))
        .await
        .map_err(fail)
}

/// Create credential secrets with freshly generated material when absent
///
/// The app secret starts without an endpoint; it is rewritten once the
/// instance publishes one.
async fn ensure_credentials(stack: &AppStack, ctx: &Context, namespace: &str) -> Result<(), Error> {
    let fail = |e: Error| e.with_retry("ensure-credentials", PROVISION_FAILED);
    let record = stack.name_any();

    let master_name = resources::master_secret_name(&record);
    if ctx
        .store
        .get_secret(&master_name, namespace)
        .await
        .map_err(fail)?
        .is_none()
    {
        info!(secret = %master_name, "generating master password");
        let secret = resources::master_password_secret(
            stack,
            namespace,
            &generate_password(DEFAULT_PASSWORD_LENGTH),
        );
        ctx.store.create_secret(&secret).await.map_err(fail)?;
    }

    let app_name = resources::app_secret_name(&record);
    if ctx
        .store
        .get_secret(&app_name, namespace)
        .await
        .map_err(fail)?
        .is_none()
    {
        info!(secret = %app_name, "generating application credentials");
        let secret = resources::app_credentials_secret(
            stack,
            &ctx.config,
            namespace,
            "",
            &generate_password(DEFAULT_PASSWORD_LENGTH),
        );
        ctx.store.create_secret(&secret).await.map_err(fail)?;
    }
    Ok(())
}

async fn ensure_database(stack: &AppStack, ctx: &Context, namespace: &str) -> Result<(), Error> {
    ctx.infra
        .ensure_database(&resources::rds_instance(stack, &ctx.config, namespace))
        .await
        .map_err(|e| e.with_retry("ensure-database", PROVISION_FAILED))
}

/// Observe the instance's lifecycle phase and endpoint
async fn observe_database(
    stack: &AppStack,
    ctx: &Context,
    status: &mut StatusWriter,
) -> Result<DatabaseReadiness, Error> {
    let instance = ctx
        .infra
        .get_database(&stack.resource_name())
        .await
        .map_err(|e| e.with_retry("observe-database", NOT_VISIBLE))?;
    let Some(instance) = instance else {
        debug!("database instance not visible yet");
        return Ok(DatabaseReadiness::Pending(NOT_VISIBLE));
    };

    let phase = project::database_phase(&instance);
    status.database_phase(&phase).await?;
    if phase != "available" {
        info!(%phase, "database instance not yet available");
        return Ok(DatabaseReadiness::Pending(DATABASE_PENDING));
    }

    let endpoint = project::database_endpoint(&instance);
    if endpoint.is_empty() {
        debug!("database endpoint not yet published");
        return Ok(DatabaseReadiness::Pending(ENDPOINT_PENDING));
    }
    Ok(DatabaseReadiness::Ready { endpoint })
}

/// Rewrite the connection secrets when the endpoint they embed is stale
///
/// Passwords are carried over from the existing secrets; only the
/// endpoint-bearing entries change.
async fn refresh_connection_secrets(
    stack: &AppStack,
    ctx: &Context,
    namespace: &str,
    endpoint: &str,
) -> Result<(), Error> {
    let fail = |e: Error| e.with_retry("refresh-credentials", NOT_VISIBLE);
    let record = stack.name_any();

    let master_name = resources::master_secret_name(&record);
    let master = ctx
        .store
        .get_secret(&master_name, namespace)
        .await
        .map_err(fail)?
        .ok_or_else(|| fail(Error::not_found("Secret", master_name)))?;
    let master_password = project::secret_value(&master, "password")
        .ok_or_else(|| fail(Error::not_found("Secret key", "password")))?;

    let app_name = resources::app_secret_name(&record);
    let app = ctx
        .store
        .get_secret(&app_name, namespace)
        .await
        .map_err(fail)?
        .ok_or_else(|| fail(Error::not_found("Secret", app_name)))?;
    let app_password = project::secret_value(&app, "password")
        .ok_or_else(|| fail(Error::not_found("Secret key", "password")))?;

    let jdbc_url = project::secret_value(&app, "jdbcUrl").unwrap_or_default();
    if jdbc_url.contains(endpoint) {
        return Ok(());
    }

    info!(%endpoint, "rewriting connection secrets with the published endpoint");
    ctx.store
        .apply_secret(&resources::app_credentials_secret(
            stack,
            &ctx.config,
            namespace,
            endpoint,
            &app_password,
        ))
        .await
        .map_err(fail)?;
    ctx.store
        .apply_secret(&resources::migration_properties_secret(
            stack,
            &ctx.config,
            namespace,
            endpoint,
            &master_password,
            &app_password,
            &generate_password(DEFAULT_PASSWORD_LENGTH),
        ))
        .await
        .map_err(fail)
}

/// Force the generated master password onto a snapshot-restored instance
///
/// Skipped entirely for instances created empty; their master password
/// was set at creation.
async fn run_reset_job(
    stack: &AppStack,
    ctx: &Context,
    namespace: &str,
    status: &mut StatusWriter,
) -> Result<Outcome, Error> {
    let restored = stack
        .spec
        .database
        .snapshot_id
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    if !restored {
        return Ok(Outcome::Advance);
    }

    let fail = |e: Error| e.with_retry("reset-credentials", JOB_FAILED);
    let record = stack.name_any();
    ctx.store
        .ensure_service_account(&resources::reset_service_account(stack, &ctx.config, namespace))
        .await
        .map_err(fail)?;
    let job = resources::reset_credentials_job(stack, &ctx.config, namespace);
    ctx.store.ensure_job(&job).await.map_err(fail)?;

    let name = job.metadata.name.clone().unwrap_or_default();
    let observed = ctx
        .store
        .get_job(&name, namespace)
        .await
        .map_err(|e| e.with_retry("observe-reset-job", JOB_OBSERVE_FAILED))?;
    match observed {
        Some(job) if project::job_succeeded(&job) >= 1 => {
            status.reset_job_status("Succeeded").await?;
            Ok(Outcome::Advance)
        }
        _ => {
            info!(job = %name, "credential reset has not completed");
            Ok(Outcome::Retry(JOB_PENDING))
        }
    }
}

/// Keep the changelog config map aligned with the packaged payload
async fn ensure_changelog(stack: &AppStack, ctx: &Context, namespace: &str) -> Result<(), Error> {
    let path = &ctx.config.changelog_path;
    let payload = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::unreadable(path.display().to_string(), e.to_string())
            .with_retry("read-changelog", CHANGELOG_UNREADABLE)
    })?;

    let desired = resources::changelog_config_map(stack, namespace, &payload);
    let name = desired.metadata.name.clone().unwrap_or_default();
    let existing = ctx
        .store
        .get_config_map(&name, namespace)
        .await
        .map_err(|e| e.with_retry("observe-changelog", NOT_VISIBLE))?;

    match existing {
        None => ctx
            .store
            .create_config_map(&desired)
            .await
            .map_err(|e| e.with_retry("create-changelog", CHANGELOG_CREATE_FAILED)),
        Some(current)
            if current.data.as_ref().and_then(|d| d.get(CHANGELOG_KEY)) != Some(&payload) =>
        {
            info!(config_map = %name, "changelog payload drifted, updating");
            ctx.store
                .apply_config_map(&desired)
                .await
                .map_err(|e| e.with_retry("update-changelog", NOT_VISIBLE))
        }
        Some(_) => Ok(()),
    }
}

/// Run the one-shot schema migration to completion
async fn run_migration_job(
    stack: &AppStack,
    ctx: &Context,
    namespace: &str,
    status: &mut StatusWriter,
) -> Result<Outcome, Error> {
    let job = resources::migration_job(stack, &ctx.config, namespace);
    ctx.store
        .ensure_job(&job)
        .await
        .map_err(|e| e.with_retry("migrate-schema", JOB_FAILED))?;

    let name = job.metadata.name.clone().unwrap_or_default();
    let observed = ctx
        .store
        .get_job(&name, namespace)
        .await
        .map_err(|e| e.with_retry("observe-migration-job", JOB_OBSERVE_FAILED))?;
    match observed {
        Some(job) if project::job_succeeded(&job) >= 1 => {
            status.migration_job_status("Succeeded").await?;
            Ok(Outcome::Advance)
        }
        _ => {
            info!(job = %name, "schema migration has not completed");
            Ok(Outcome::Retry(JOB_PENDING))
        }
    }
}

/// Restore a block volume from a snapshot and serve it over NFS
async fn restore_block_volume(
    stack: &AppStack,
    ctx: &Context,
    namespace: &str,
    ebs: &EbsParams,
    status: &mut StatusWriter,
) -> Result<Outcome, Error> {
    let fail = |e: Error| e.with_retry("restore-block-volume", FILESYSTEM_FAILED);
    let record = stack.name_any();

    ctx.infra
        .ensure_volume(&resources::ebs_volume(stack, &ctx.config))
        .await
        .map_err(fail)?;
    let volume = ctx
        .infra
        .get_volume(&stack.resource_name())
        .await
        .map_err(fail)?;
    let volume_id = volume.as_ref().map(project::volume_id).unwrap_or_default();
    if volume_id.is_empty() {
        debug!("restored volume has no identifier yet");
        return Ok(Outcome::Retry(NOT_VISIBLE));
    }

    // Server storage: the zone-pinned volume backs the NFS server's claim
    let server = resources::nfs_server_name(&record);
    let uid = stack.metadata.uid.clone().unwrap_or_default();
    ctx.store
        .ensure_persistent_volume(&resources::ebs_persistent_volume(stack, &volume_id, namespace))
        .await
        .map_err(fail)?;
    ctx.store
        .ensure_claim(&resources::persistent_volume_claim(
            stack,
            server.clone(),
            namespace,
            format!("{server}-{uid}"),
            ebs.storage_class_name.clone(),
            stack.spec.shared_fs.volume_size,
            "ReadWriteOnce",
        ))
        .await
        .map_err(fail)?;
    ctx.store
        .ensure_service(&resources::nfs_server_service(stack, namespace))
        .await
        .map_err(fail)?;
    ctx.store
        .ensure_stateful_set(&resources::nfs_server_stateful_set(stack, &ctx.config, namespace))
        .await
        .map_err(fail)?;

    let set = ctx
        .store
        .get_stateful_set(&server, namespace)
        .await
        .map_err(fail)?;
    if set.as_ref().map(project::stateful_set_ready).unwrap_or_default() < 1 {
        info!("NFS server is not ready");
        return Ok(Outcome::Retry(MOUNT_TARGET_PENDING));
    }

    let service = ctx.store.get_service(&server, namespace).await.map_err(fail)?;
    let cluster_ip = service
        .as_ref()
        .map(project::service_cluster_ip)
        .unwrap_or_default();
    if cluster_ip.is_empty() {
        info!("NFS service has no cluster IP");
        return Ok(Outcome::Retry(CLUSTER_IP_PENDING));
    }

    // Application storage: the shared home mounts the server over NFS
    ctx.store
        .ensure_persistent_volume(&resources::nfs_persistent_volume(stack, &cluster_ip, namespace))
        .await
        .map_err(|e| e.with_retry("bind-shared-home", PROVISION_FAILED))?;
    ctx.store
        .ensure_claim(&resources::persistent_volume_claim(
            stack,
            resources::shared_home_claim_name(&record),
            namespace,
            resources::shared_home_pv_name(stack),
            ebs.storage_class_name.clone(),
            stack.spec.shared_fs.volume_size,
            "ReadWriteMany",
        ))
        .await
        .map_err(|e| e.with_retry("bind-shared-home", BINDING_FAILED))?;

    status.ebs_id(&volume_id).await?;
    Ok(Outcome::Advance)
}

/// Restore the shared home from a stored filesystem snapshot handle
async fn restore_filesystem_snapshot(
    stack: &AppStack,
    ctx: &Context,
    namespace: &str,
    _fsx: &FsxParams,
    status: &mut StatusWriter,
) -> Result<Outcome, Error> {
    let fail = |e: Error| e.with_retry("restore-filesystem-snapshot", BINDING_FAILED);
    let record = stack.name_any();

    ctx.store
        .ensure_snapshot_content(&resources::fsx_snapshot_content(stack, namespace))
        .await
        .map_err(fail)?;
    ctx.store
        .ensure_snapshot(&resources::fsx_snapshot(stack, namespace))
        .await
        .map_err(fail)?;
    ctx.store
        .ensure_claim(&resources::fsx_snapshot_pvc(stack, namespace))
        .await
        .map_err(fail)?;

    let claim_name = resources::shared_home_claim_name(&record);
    let claim = ctx
        .store
        .get_claim(&claim_name, namespace)
        .await
        .map_err(fail)?;
    let Some(claim) = claim else {
        return Ok(Outcome::Retry(BINDING_PENDING));
    };
    if project::claim_phase(&claim) != "Bound" {
        info!(claim = %claim_name, "snapshot-sourced claim is not bound");
        return Ok(Outcome::Retry(BINDING_PENDING));
    }

    // The restored volume's CSI handle is the filesystem identity
    let volume_name = project::claim_volume_name(&claim);
    if volume_name.is_empty() {
        return Ok(Outcome::Retry(BINDING_PENDING));
    }
    let volume = ctx
        .store
        .get_persistent_volume(&volume_name)
        .await
        .map_err(fail)?
        .ok_or_else(|| fail(Error::not_found("PersistentVolume", volume_name)))?;
    let handle = project::volume_handle(&volume);
    if handle.is_empty() {
        return Ok(Outcome::Retry(BINDING_PENDING));
    }

    status.fsx_id(&handle).await?;
    Ok(Outcome::Advance)
}

/// Provision a new managed filesystem with per-subnet mount targets
async fn provision_new_filesystem(
    stack: &AppStack,
    ctx: &Context,
    namespace: &str,
    efs: &EfsParams,
    status: &mut StatusWriter,
) -> Result<Outcome, Error> {
    let record = stack.name_any();
    ctx.infra
        .ensure_filesystem(&resources::efs_filesystem(stack, &ctx.config, namespace))
        .await
        .map_err(|e| e.with_retry("provision-filesystem", FILESYSTEM_FAILED))?;

    let filesystem = ctx
        .infra
        .get_filesystem(&stack.resource_name())
        .await
        .map_err(|e| e.with_retry("observe-filesystem", JOB_OBSERVE_FAILED))?;
    let filesystem_id = filesystem
        .as_ref()
        .map(project::filesystem_id)
        .unwrap_or_default();
    if filesystem_id.is_empty() {
        debug!("filesystem has no identifier yet");
        return Ok(Outcome::Retry(NOT_VISIBLE));
    }

    // Targets attach one subnet at a time; a pending target blocks the
    // later subnets so partial attachment stays observable
    for index in 0..stack.spec.network.subnet_ids.len() {
        let fail =
            |e: Error| e.with_retry("attach-mount-target", MOUNT_TARGET_PENDING);
        ctx.infra
            .ensure_mount_target(&resources::mount_target(stack, &filesystem_id, index))
            .await
            .map_err(fail)?;
        let target = ctx
            .infra
            .get_mount_target(&resources::mount_target_name(stack, index))
            .await
            .map_err(fail)?;
        let state = target
            .as_ref()
            .map(project::mount_target_state)
            .unwrap_or_default();
        if state != "available" {
            info!(index, %state, "mount target not yet available");
            return Ok(Outcome::Retry(MOUNT_TARGET_PENDING));
        }
    }

    let fail = |e: Error| e.with_retry("bind-shared-home", BINDING_FAILED);
    ctx.store
        .ensure_persistent_volume(&resources::efs_persistent_volume(
            stack,
            &filesystem_id,
            namespace,
        ))
        .await
        .map_err(fail)?;
    ctx.store
        .ensure_claim(&resources::persistent_volume_claim(
            stack,
            resources::shared_home_claim_name(&record),
            namespace,
            resources::shared_home_pv_name(stack),
            efs.storage_class_name.clone(),
            10,
            "ReadWriteMany",
        ))
        .await
        .map_err(fail)?;

    status.efs_id(&filesystem_id).await?;
    Ok(Outcome::Advance)
}

/// Render the ApplicationSet manifest and hand it to the deployment
/// controller
async fn hand_off_manifest(stack: &AppStack, ctx: &Context) -> Result<(), Error> {
    let fail = |e: Error| e.with_retry("hand-off-manifest", HANDOFF_FAILED);
    let record = stack.name_any();

    let template_path = &ctx.config.template_path;
    let template = tokio::fs::read_to_string(template_path).await.map_err(|e| {
        fail(Error::unreadable(
            template_path.display().to_string(),
            e.to_string(),
        ))
    })?;
    let rendered = gitops::render_application_set(&template, stack, &ctx.config).map_err(fail)?;
    let path = gitops::write_manifest(&ctx.config, &record, &rendered)
        .await
        .map_err(fail)?;
    ctx.gitops.apply(&path).await.map_err(fail)
}

/// Fold the deployed application's phases into the status
async fn observe_application(
    stack: &AppStack,
    ctx: &Context,
    status: &mut StatusWriter,
) -> Result<(), Error> {
    let fail = |e: Error| e.with_retry("observe-application", APP_QUERY_FAILED);
    let record = stack.name_any();
    let gitops_namespace = &stack.spec.gitops.namespace;

    let sync = ctx
        .gitops
        .sync_status(&record, gitops_namespace)
        .await
        .map_err(fail)?;
    status.app_sync(&sync).await?;

    let health = ctx
        .gitops
        .health_status(&record, gitops_namespace)
        .await
        .map_err(fail)?;
    status.app_health(&health).await?;

    if health != "Healthy" {
        info!(%health, "application is not yet healthy");
    }
    Ok(())
}
