//! # proc_run
//!
//! Bounded execution of external commands and in-process callbacks.
//!
//! `proc_run` runs one unit of work — a command line handed to the platform's
//! command interpreter, or a callback invoked inside the calling program as if
//! it were a child process — and reconciles launch, output capture, and
//! deadline enforcement into a single status/return-code pair. A runaway child
//! is killed when its deadline elapses rather than leaked.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proc_run::{run, CaptureBuffer, RunRequest, RunStatus};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let mut buf = CaptureBuffer::with_capacity(256);
//!
//! let result = run(RunRequest::command("echo test")
//!     .max_wait(Duration::from_secs(2))
//!     .capture(&mut buf))
//!     .await;
//!
//! assert_eq!(result.status, RunStatus::Success);
//! assert_eq!(result.return_code, 0);
//! assert_eq!(buf.as_bytes(), b"test\n");
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **One call, one result**: every invocation produces exactly one
//!   [`RunResult`]; errors are folded into its status, never raised past it
//! - **No concurrency outlives a blocking call**: the child is waited for or
//!   killed, the timer cancelled, and the capture channel drained before the
//!   call returns
//! - **Bounded capture**: the caller's [`CaptureBuffer`] is never overrun;
//!   overflow is discarded and the buffer is always NUL-finalized
//! - **No retries**: every condition surfaces once; the caller decides
//!
//! ## Platform Support
//!
//! External commands run through `/bin/sh -c` on Unix and `cmd /C` on
//! Windows. The in-process callback mode needs a restorable swap of the
//! process-wide stdout descriptor and is therefore Unix only; elsewhere it
//! reports [`RunStatus::NotSupported`] without starting anything.

mod capture;
mod deadline;
mod elevate;
mod error;
mod launcher;
mod plan;
#[cfg(unix)]
mod redirect;
mod request;
mod result;
mod run;

// Public API
pub use capture::CaptureBuffer;
pub use error::{LaunchError, PlanError};
pub use request::{RunCallback, RunRequest};
pub use result::{RunResult, RunStatus, NO_RETURN_CODE};
pub use run::{run, run_sync};
