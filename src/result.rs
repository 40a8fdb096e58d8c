//! Run result and status reconciliation.
//!
//! Every call produces exactly one [`RunResult`]. The constructors here are
//! the terminal states of the call's state machine; launch errors are folded
//! in through [`RunResult::from_launch_error`] so the public entry never
//! surfaces an `Err`.

use crate::error::LaunchError;

/// Sentinel return code used when no exit value is meaningful: the work
/// never started, is still running in the background, or was killed on
/// timeout.
pub const NO_RETURN_CODE: i32 = -1;

/// Outcome kind of one execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// The request was invalid; nothing was started.
    BadParameter,
    /// The plan needs a capability this platform lacks; nothing was started.
    NotSupported,
    /// Launching or supervising the work failed.
    Failure,
    /// Non-blocking call; the work was handed off and no result is observed.
    Invoked,
    /// The deadline elapsed first; the work was forcibly terminated.
    TimedOut,
    /// The work completed within any deadline.
    Success,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::BadParameter => write!(f, "bad parameter"),
            RunStatus::NotSupported => write!(f, "not supported"),
            RunStatus::Failure => write!(f, "failure"),
            RunStatus::Invoked => write!(f, "invoked"),
            RunStatus::TimedOut => write!(f, "timed out"),
            RunStatus::Success => write!(f, "success"),
        }
    }
}

/// Final outcome of one execution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Outcome kind.
    pub status: RunStatus,
    /// The work's exit value, or [`NO_RETURN_CODE`] when none is meaningful.
    pub return_code: i32,
}

impl RunResult {
    /// Request invalid; nothing started.
    pub(crate) fn bad_parameter() -> Self {
        Self {
            status: RunStatus::BadParameter,
            return_code: NO_RETURN_CODE,
        }
    }

    /// Platform capability gap; nothing started.
    pub(crate) fn not_supported() -> Self {
        Self {
            status: RunStatus::NotSupported,
            return_code: NO_RETURN_CODE,
        }
    }

    /// Launch or supervision error.
    pub(crate) fn failure() -> Self {
        Self {
            status: RunStatus::Failure,
            return_code: NO_RETURN_CODE,
        }
    }

    /// Work handed off without waiting.
    pub(crate) fn invoked() -> Self {
        Self {
            status: RunStatus::Invoked,
            return_code: 0,
        }
    }

    /// Deadline elapsed; work terminated.
    pub(crate) fn timed_out() -> Self {
        Self {
            status: RunStatus::TimedOut,
            return_code: NO_RETURN_CODE,
        }
    }

    /// Work completed; `return_code` carries its exit value.
    pub(crate) fn success(return_code: i32) -> Self {
        Self {
            status: RunStatus::Success,
            return_code,
        }
    }

    /// Fold a launch error into its terminal status: a capability gap maps
    /// to `NotSupported`, everything else to `Failure`.
    pub(crate) fn from_launch_error(error: &LaunchError) -> Self {
        if error.is_capability_gap() {
            Self::not_supported()
        } else {
            Self::failure()
        }
    }

    /// Whether the work completed within any deadline.
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
