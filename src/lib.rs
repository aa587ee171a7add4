//! AppStack Kubernetes operator for full application stack provisioning
//!
//! An AppStack record describes a managed database, a shared filesystem
//! and a GitOps-deployed application bundle. The controller materializes
//! the dependent cloud resources through a provisioning provider, runs
//! one-shot credential and schema jobs, hands the application manifest to
//! the deployment controller and folds observed state back into the
//! record's status.

#![deny(missing_docs)]

/// Operator configuration (tags, images, paths)
pub mod config;
/// Controller wiring, the convergence driver and its client seams
pub mod controller;
/// AppStack Custom Resource Definition
pub mod crd;
/// Random credential material
pub mod credentials;
/// Error types and requeue hints
pub mod error;
/// ApplicationSet rendering and the deployment-controller hand-off
pub mod gitops;
/// Provisioning-provider resource types
pub mod provider;
/// Materializers for dependent objects
pub mod resources;

pub use error::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
