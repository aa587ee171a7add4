//! GitOps hand-off
//!
//! Rendering the deployment-controller manifest and applying it through
//! an injectable subprocess adapter.

mod client;
mod render;

pub use client::{GitOpsClient, Kubectl};
pub use render::{manifest_path, render_application_set, write_manifest};

#[cfg(test)]
pub use client::MockGitOpsClient;
