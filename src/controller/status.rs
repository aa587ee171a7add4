//! Status delta writer
//!
//! Owns the recorded status for one reconcile invocation and issues a
//! status patch only when a written value differs from the recorded one.
//! Equal values cost zero API writes; a changed value costs exactly one.

use std::sync::Arc;
use tracing::debug;

use crate::crd::{AppStack, AppStackStatus};
use crate::Error;

use super::client::StoreClient;

/// Delta-minimal writer over the record's status subresource
pub struct StatusWriter {
    store: Arc<dyn StoreClient>,
    name: String,
    recorded: AppStackStatus,
}

impl StatusWriter {
    /// Start from the record's currently observed status
    pub fn new(store: Arc<dyn StoreClient>, stack: &AppStack) -> Self {
        Self {
            store,
            name: stack.metadata.name.clone().unwrap_or_default(),
            recorded: stack.status.clone().unwrap_or_default(),
        }
    }

    /// The status as recorded after the writes so far
    pub fn recorded(&self) -> &AppStackStatus {
        &self.recorded
    }

    async fn write<F>(&mut self, field: &'static str, value: &str, set: F) -> Result<(), Error>
    where
        F: FnOnce(&mut AppStackStatus) -> &mut String,
    {
        let slot = set(&mut self.recorded);
        if slot == value {
            return Ok(());
        }
        debug!(field, value, "status field changed");
        *slot = value.to_string();
        self.store.patch_status(&self.name, &self.recorded).await
    }

    /// Record the database lifecycle phase
    pub async fn database_phase(&mut self, value: &str) -> Result<(), Error> {
        self.write("database.phase", value, |s| &mut s.database.phase)
            .await
    }

    /// Record the database endpoint address
    pub async fn database_endpoint(&mut self, value: &str) -> Result<(), Error> {
        self.write("database.endpoint", value, |s| &mut s.database.endpoint)
            .await
    }

    /// Record the schema-migration job phase
    pub async fn migration_job_status(&mut self, value: &str) -> Result<(), Error> {
        self.write("database.migrationJobStatus", value, |s| {
            &mut s.database.migration_job_status
        })
        .await
    }

    /// Record the credential-reset job phase
    pub async fn reset_job_status(&mut self, value: &str) -> Result<(), Error> {
        self.write("database.resetCredentialsJobStatus", value, |s| {
            &mut s.database.reset_credentials_job_status
        })
        .await
    }

    /// Record the provisioned filesystem identifier
    pub async fn efs_id(&mut self, value: &str) -> Result<(), Error> {
        self.write("sharedFilesystem.efsId", value, |s| {
            &mut s.shared_filesystem.efs_id
        })
        .await
    }

    /// Record the restored block volume identifier
    pub async fn ebs_id(&mut self, value: &str) -> Result<(), Error> {
        self.write("sharedFilesystem.ebsId", value, |s| {
            &mut s.shared_filesystem.ebs_id
        })
        .await
    }

    /// Record the snapshot-restored volume handle
    pub async fn fsx_id(&mut self, value: &str) -> Result<(), Error> {
        self.write("sharedFilesystem.fsxId", value, |s| {
            &mut s.shared_filesystem.fsx_id
        })
        .await
    }

    /// Record the application sync phase
    pub async fn app_sync(&mut self, value: &str) -> Result<(), Error> {
        self.write("app.sync", value, |s| &mut s.app.sync).await
    }

    /// Record the application health phase
    pub async fn app_health(&mut self, value: &str) -> Result<(), Error> {
        self.write("app.health", value, |s| &mut s.app.health).await
    }
}
