//! Error types for the AppStack operator
//!
//! Every error path in the reconciler re-schedules; there is no permanent
//! failure state. Errors therefore carry an optional requeue hint that
//! `error_policy` turns into the next invocation delay.

use std::time::Duration;

use thiserror::Error;

/// Default requeue delay applied when an error carries no explicit hint
pub const DEFAULT_ERROR_REQUEUE: Duration = Duration::from_secs(5);

/// Main error type for AppStack operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for the AppStack spec
    #[error("validation error for {stack}: {message}")]
    Validation {
        /// Name of the record with an invalid spec
        stack: String,
        /// Description of what is invalid
        message: String,
    },

    /// A required object was not found in the control-plane store
    #[error("{kind} {name} not found")]
    NotFound {
        /// Kind of the missing object
        kind: &'static str,
        /// Name of the missing object
        name: String,
    },

    /// Static input (change-log payload, template) could not be read
    #[error("unreadable input {path}: {message}")]
    UnreadableInput {
        /// Path that failed to load
        path: String,
        /// Description of the I/O failure
        message: String,
    },

    /// Template rendering error
    #[error("template error: {source}")]
    Template {
        /// The underlying minijinja error
        #[from]
        source: minijinja::Error,
    },

    /// GitOps hand-off error (apply or status query)
    #[error("gitops error [{operation}]: {message}")]
    GitOps {
        /// Operation that failed (apply, sync-status, health-status)
        operation: &'static str,
        /// Description of what failed
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },

    /// A pipeline step failed and requested a specific re-invocation delay
    #[error("step {step} failed: {source}")]
    Step {
        /// Name of the step that failed
        step: &'static str,
        /// Requested delay before the next invocation
        retry_after: Duration,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a validation error
    pub fn validation(stack: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            stack: stack.into(),
            message: msg.into(),
        }
    }

    /// Create a not-found error for an object the pipeline requires to exist
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an unreadable-input error
    pub fn unreadable(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::UnreadableInput {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a gitops error
    pub fn gitops(operation: &'static str, msg: impl Into<String>) -> Self {
        Self::GitOps {
            operation,
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Attach a step name and requeue hint to this error
    ///
    /// Used by pipeline steps to express the Fail(error, delay) outcome:
    /// the error propagates out of `reconcile` and `error_policy` schedules
    /// the re-invocation after `retry_after`.
    pub fn with_retry(self, step: &'static str, retry_after: Duration) -> Self {
        Self::Step {
            step,
            retry_after,
            source: Box::new(self),
        }
    }

    /// The requeue delay this error requests, if any
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::Step { retry_after, .. } => *retry_after,
            _ => DEFAULT_ERROR_REQUEUE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wrapper_carries_requeue_hint() {
        let err = Error::not_found("RDSInstance", "stack-abc")
            .with_retry("database-phase", Duration::from_secs(30));
        assert_eq!(err.retry_after(), Duration::from_secs(30));
        assert!(err.to_string().contains("database-phase"));
    }

    #[test]
    fn unhinted_error_falls_back_to_default() {
        let err = Error::serialization("bad yaml");
        assert_eq!(err.retry_after(), DEFAULT_ERROR_REQUEUE);
    }
}
