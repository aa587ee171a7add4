//! Custom Resource Definitions

mod appstack;
mod types;

pub use appstack::{
    AppHealthStatus, AppStack, AppStackSpec, AppStackStatus, DatabaseStatus,
    SharedFilesystemStatus,
};
pub use types::{
    DatabaseSpec, EbsParams, EfsParams, FsStrategy, FsxParams, GitOpsSpec, HelmChartSpec,
    HelmValuesSpec, NetworkSpec, SharedFsSpec, SyncPolicySpec,
};
