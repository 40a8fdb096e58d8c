//! Error types for proc_run.
//!
//! Two categories, split by phase:
//! - [`PlanError`]: the request was rejected during validation - nothing was started
//! - [`LaunchError`]: the plan was valid but launching or supervising it failed
//!
//! Neither type crosses the public entry point as an `Err`; the result
//! reconciler folds both into a [`crate::RunStatus`].

use thiserror::Error;

/// Request rejected during validation.
///
/// No process, thread, or redirection exists when one of these is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Neither a command line nor a callback was supplied
    #[error("neither a command line nor a callback was supplied")]
    NothingToRun,
}

/// Launching or supervising a valid plan failed.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The OS refused to spawn the child process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed { reason: String },

    /// Waiting on the child process failed
    #[error("failed to wait for process: {reason}")]
    WaitFailed { reason: String },

    /// Swapping the process-wide stdout descriptor failed
    #[error("failed to redirect stdout: {reason}")]
    RedirectFailed { reason: String },

    /// The callback worker panicked instead of returning an exit value
    #[error("callback worker panicked")]
    CallbackPanicked,

    /// In-process callback execution is not available on this platform
    #[error("in-process callback execution is not supported on this platform")]
    CallbackNotSupported,
}

impl LaunchError {
    /// Whether this error represents a platform capability gap rather than a
    /// runtime failure.
    pub fn is_capability_gap(&self) -> bool {
        matches!(self, LaunchError::CallbackNotSupported)
    }
}
