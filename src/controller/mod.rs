//! AppStack controller
//!
//! Wires the convergence driver into a kube-rs controller stream: watched
//! AppStack records flow through [`reconcile`], failures through
//! [`error_policy`], and both schedule the next invocation.

mod appstack;
mod client;
mod project;
mod status;

pub use appstack::{error_policy, reconcile, Context, Outcome};
pub use client::{
    InfraClient, InfraClientImpl, StoreClient, StoreClientImpl, FIELD_MANAGER,
};
pub use status::StatusWriter;

#[cfg(test)]
pub use client::{MockInfraClient, MockStoreClient};

use std::sync::Arc;

use futures::StreamExt;
use kube::runtime::controller::Controller;
use kube::runtime::watcher;
use kube::{Api, Client};
use tracing::{info, warn};

use crate::config::OperatorConfig;
use crate::crd::AppStack;

/// Watch AppStack records and drive them to convergence
///
/// Runs until the watch stream ends.
pub async fn run(client: Client, config: OperatorConfig) {
    let stacks: Api<AppStack> = Api::all(client.clone());
    let ctx = Arc::new(Context::new(client, config));

    info!("starting controller");
    Controller::new(stacks, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((record, action)) => {
                    info!(record = %record.name, ?action, "reconciled");
                }
                Err(e) => warn!(error = %e, "reconciliation error"),
            }
        })
        .await;
    info!("controller stream ended");
}
