//! AppStack operator binary

use clap::Parser;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use appstack::config::OperatorConfig;
use appstack::controller::{self, FIELD_MANAGER};
use appstack::crd::AppStack;

/// AppStack - Kubernetes operator for full application stack provisioning
#[derive(Parser, Debug)]
#[command(name = "appstack", version, about, long_about = None)]
struct Cli {
    /// Generate the CRD manifest and exit
    #[arg(long)]
    crd: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&AppStack::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    // The operator installs its own CRD on startup so the installed
    // version always matches the operator version
    ensure_crd_installed(&client).await?;

    let config = OperatorConfig::from_env();
    controller::run(client, config).await;
    Ok(())
}

/// Install or update the AppStack CRD using server-side apply
async fn ensure_crd_installed(client: &Client) -> anyhow::Result<()> {
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    tracing::info!("Installing AppStack CRD...");
    crds.patch(
        "appstacks.appstack.dev",
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&AppStack::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to install AppStack CRD: {}", e))?;
    Ok(())
}
