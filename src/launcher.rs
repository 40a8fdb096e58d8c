//! Launcher: starts a validated plan and hands back the in-flight work.
//!
//! External commands become a child of the platform command interpreter,
//! with stdout piped into the capture channel when the caller waits.
//! In-process callbacks become a blocking worker task running behind the
//! process-wide stdout swap.

use crate::elevate::Elevation;
use crate::error::LaunchError;
use std::process::Stdio;
use tokio::process::{Child, ChildStdout};
use tracing::debug;

/// A spawned child plus the capture channel's read end (present only when
/// stdout was piped).
pub(crate) struct LaunchedProcess {
    pub(crate) child: Child,
    pub(crate) stdout: Option<ChildStdout>,
}

/// Spawn `line` through the platform command interpreter.
///
/// `pipe_stdout` selects the blocking wiring (stdout piped into the capture
/// channel) versus the fire-and-forget wiring (stdout inherited). Stdin is
/// always null so a child can never hang on terminal input.
///
/// # Errors
///
/// [`LaunchError::SpawnFailed`] when the OS refuses the spawn; no deadline
/// monitor or capture drain exists at that point.
pub(crate) fn spawn_command(
    line: &str,
    privileged: bool,
    pipe_stdout: bool,
) -> Result<LaunchedProcess, LaunchError> {
    let strategy = Elevation::detect(privileged);
    let mut cmd = strategy.shell_command(line);
    cmd.stdin(Stdio::null());
    if pipe_stdout {
        cmd.stdout(Stdio::piped());
    }

    debug!(command = line, strategy = ?strategy, "spawning child process");
    let mut child = cmd.spawn().map_err(|e| LaunchError::SpawnFailed {
        reason: e.to_string(),
    })?;

    let stdout = if pipe_stdout {
        child.stdout.take()
    } else {
        None
    };
    Ok(LaunchedProcess { child, stdout })
}

/// An in-process callback running on a blocking worker, with the stdout
/// swap guard and the capture channel's read end.
#[cfg(unix)]
pub(crate) struct LaunchedCallback {
    pub(crate) worker: tokio::task::JoinHandle<i32>,
    pub(crate) output: tokio::net::unix::pipe::Receiver,
    pub(crate) guard: crate::redirect::StdoutRedirect,
}

/// Start a callback behind the stdout swap.
///
/// Acquires the global stdout slot (waiting if another call holds it),
/// installs the capture pipe, then hands the callback to a blocking worker.
/// The guard must be restored before the returned receiver can reach EOF.
#[cfg(unix)]
pub(crate) async fn start_callback(
    func: crate::request::RunCallback,
    argv: Vec<String>,
) -> Result<LaunchedCallback, LaunchError> {
    let (guard, output) = crate::redirect::redirect_stdout().await?;
    debug!(argv = ?argv, "starting in-process callback worker");
    let worker = tokio::task::spawn_blocking(move || func(&argv));
    Ok(LaunchedCallback {
        worker,
        output,
        guard,
    })
}
