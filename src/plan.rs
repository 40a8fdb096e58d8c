//! Command plan builder.
//!
//! Pure validation and classification: a request's `command`/`callback` pair
//! becomes an [`ExecPlan`] or a [`PlanError`]. No side effects; nothing is
//! spawned, redirected, or touched here.

use crate::error::PlanError;
use crate::request::RunCallback;

/// A validated execution plan.
///
/// The only input the launcher accepts, so every launch has passed
/// validation first.
pub(crate) enum ExecPlan {
    /// Spawn a separate OS process from a literal command line.
    Command { line: String },

    /// Invoke a function in-process instead of spawning.
    Callback {
        func: RunCallback,
        /// Argv-style labels handed to the callback, taken from the
        /// request's command text (empty when no text was supplied).
        argv: Vec<String>,
    },
}

/// Classify a request's work fields into a plan.
///
/// The callback wins when both fields are set; the command text then serves
/// only as the callback's argv labels. Command text is passed through
/// verbatim — an empty line is the interpreter's no-op, not a rejection.
///
/// # Errors
///
/// [`PlanError::NothingToRun`] when neither field is set.
pub(crate) fn build(
    command: Option<String>,
    callback: Option<RunCallback>,
) -> Result<ExecPlan, PlanError> {
    if let Some(func) = callback {
        let argv = command
            .as_deref()
            .map(|text| text.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        return Ok(ExecPlan::Callback { func, argv });
    }

    match command {
        None => Err(PlanError::NothingToRun),
        Some(line) => Ok(ExecPlan::Command { line }),
    }
}
