//! Entry point: plan, launch, race, reconcile.
//!
//! One call creates at most one unit of OS-level concurrency (a child
//! process or a blocking worker) plus, when a deadline is set, the timer
//! inside the race. Everything a blocking call creates is joined, killed, or
//! drained before it returns; a non-blocking call deliberately leaves the
//! child to the operating system.

use crate::capture::{CaptureBuffer, CaptureSink};
use crate::deadline::{self, Waited};
use crate::error::LaunchError;
use crate::launcher;
use crate::plan::{self, ExecPlan};
use crate::request::{RunCallback, RunRequest};
use crate::result::{RunResult, NO_RETURN_CODE};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::{Child, ChildStdout};
use tracing::{debug, warn};

/// Execute one request and reconcile the outcome.
///
/// Never returns an error; every condition is folded into the result's
/// status and return code.
pub async fn run(request: RunRequest<'_>) -> RunResult {
    let RunRequest {
        command,
        callback,
        blocking,
        privileged,
        max_wait,
        capture,
    } = request;

    match plan::build(command, callback) {
        Err(e) => {
            warn!(error = %e, "request rejected");
            RunResult::bad_parameter()
        }
        Ok(ExecPlan::Command { line }) => {
            run_command(line, privileged, blocking, max_wait, capture).await
        }
        Ok(ExecPlan::Callback { func, argv }) => {
            if privileged {
                debug!("privilege elevation ignored for in-process callback");
            }
            run_callback(func, argv, blocking, max_wait, capture).await
        }
    }
}

/// Blocking wrapper around [`run`].
///
/// Uses the ambient runtime when one exists (on a scoped thread, since the
/// calling thread may be a runtime worker), otherwise builds a throwaway
/// current-thread runtime.
pub fn run_sync(request: RunRequest<'_>) -> RunResult {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        std::thread::scope(|s| s.spawn(|| handle.block_on(run(request))).join().unwrap())
    } else {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "failed to build runtime for blocking call");
                return RunResult::failure();
            }
        };
        rt.block_on(run(request))
    }
}

async fn run_command(
    line: String,
    privileged: bool,
    blocking: bool,
    max_wait: Option<Duration>,
    capture: Option<&mut CaptureBuffer>,
) -> RunResult {
    if !blocking {
        return match launcher::spawn_command(&line, privileged, false) {
            Ok(launched) => {
                // Ownership of the child passes to the OS; its exit code is
                // never observed here.
                drop(launched);
                RunResult::invoked()
            }
            Err(e) => {
                warn!(command = %line, error = %e, "launch failed");
                RunResult::from_launch_error(&e)
            }
        };
    }

    let mut sink = CaptureSink::attach(capture);
    let mut launched = match launcher::spawn_command(&line, privileged, true) {
        Ok(launched) => launched,
        Err(e) => {
            warn!(command = %line, error = %e, "launch failed");
            sink.finish();
            return RunResult::from_launch_error(&e);
        }
    };

    let stdout = launched.stdout.take();
    let outcome = deadline::race(
        supervise_child(&mut launched.child, stdout, &mut sink),
        max_wait,
    )
    .await;

    let result = match outcome {
        Waited::Completed(Ok(status)) => {
            RunResult::success(status.code().unwrap_or(NO_RETURN_CODE))
        }
        Waited::Completed(Err(e)) => {
            warn!(command = %line, error = %e, "supervision failed");
            RunResult::failure()
        }
        Waited::Expired => {
            debug!(command = %line, "deadline elapsed; killing child");
            // Best-effort: the child may have exited in the race; a kill
            // failure never changes the reported status.
            if let Err(e) = launched.child.kill().await {
                debug!(error = %e, "kill after deadline failed");
            }
            RunResult::timed_out()
        }
    };

    // The channel is sealed before the result is handed back, on every path.
    sink.finish();
    result
}

/// Drain the capture channel to EOF, then reap the child.
///
/// The drain-before-wait order guarantees the caller's buffer is final when
/// the exit status is observed. A drain error is logged and tolerated; the
/// child still gets reaped.
async fn supervise_child(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    sink: &mut CaptureSink<'_>,
) -> Result<ExitStatus, LaunchError> {
    if let Some(mut out) = stdout {
        if let Err(e) = sink.drain_from(&mut out).await {
            warn!(error = %e, "stdout drain failed; still waiting for exit");
        }
    }
    child.wait().await.map_err(|e| LaunchError::WaitFailed {
        reason: e.to_string(),
    })
}

#[cfg(unix)]
async fn run_callback(
    func: RunCallback,
    argv: Vec<String>,
    blocking: bool,
    max_wait: Option<Duration>,
    capture: Option<&mut CaptureBuffer>,
) -> RunResult {
    if !blocking {
        // A plain thread, not a runtime worker: the hand-off must outlive a
        // throwaway `run_sync` runtime, which would wait for its blocking
        // pool on shutdown.
        debug!("handing off callback worker");
        std::thread::spawn(move || func(&argv));
        return RunResult::invoked();
    }

    let mut sink = CaptureSink::attach(capture);
    let launched = match launcher::start_callback(func, argv).await {
        Ok(launched) => launched,
        Err(e) => {
            warn!(error = %e, "callback launch failed");
            sink.finish();
            return RunResult::from_launch_error(&e);
        }
    };
    let launcher::LaunchedCallback {
        mut worker,
        mut output,
        guard,
    } = launched;
    let mut guard_slot = Some(guard);

    let outcome = deadline::race(
        async {
            let (code, drained) = tokio::join!(
                async {
                    let code = (&mut worker).await.map_err(|_| LaunchError::CallbackPanicked);
                    // Restore stdout now so the drain side sees EOF.
                    if let Some(guard) = guard_slot.take() {
                        guard.restore();
                    }
                    code
                },
                sink.drain_from(&mut output),
            );
            if let Err(e) = drained {
                warn!(error = %e, "callback output drain failed");
            }
            code
        },
        max_wait,
    )
    .await;

    let result = match outcome {
        Waited::Completed(Ok(code)) => RunResult::success(code),
        Waited::Completed(Err(e)) => {
            warn!(error = %e, "callback worker failed");
            RunResult::failure()
        }
        Waited::Expired => {
            // A blocking worker cannot be interrupted; it is abandoned and
            // any late output goes to the restored stdout, not the buffer.
            debug!("deadline elapsed; abandoning callback worker");
            RunResult::timed_out()
        }
    };

    // The expiry path still holds the redirection; release it before the
    // buffer is considered final.
    if let Some(guard) = guard_slot.take() {
        guard.restore();
    }
    sink.finish();
    result
}

/// Callback execution needs a restorable process-wide stdout swap, which
/// this platform does not provide; report the capability gap without
/// starting anything.
#[cfg(not(unix))]
async fn run_callback(
    func: RunCallback,
    argv: Vec<String>,
    blocking: bool,
    max_wait: Option<Duration>,
    capture: Option<&mut CaptureBuffer>,
) -> RunResult {
    let _ = (func, argv, blocking, max_wait, capture);
    warn!("in-process callback execution is not supported on this platform");
    RunResult::not_supported()
}
