//! Process-wide stdout swap for in-process callback capture.
//!
//! The real stdout descriptor is a single global resource: only one call may
//! hold it redirected at a time, so holders serialize on a static mutex. The
//! swap itself is the classic `dup`/`dup2` dance — save a duplicate of fd 1,
//! install the pipe's write end over it, and restore the duplicate when the
//! guard is released. Restoration runs on every exit path via `Drop`.
//!
//! Unix only: this is the one platform family where the swap is reversible.

use crate::error::LaunchError;
use std::io::Write;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use tokio::net::unix::pipe;
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Serializes ownership of the redirected stdout descriptor.
static STDOUT_SLOT: Mutex<()> = Mutex::const_new(());

/// RAII guard over the redirected process-wide stdout.
///
/// While this guard lives, fd 1 writes into the capture pipe. Dropping it
/// (or calling [`restore`](Self::restore)) flushes and reinstates the saved
/// stdout, after which the pipe's read end sees EOF.
pub(crate) struct StdoutRedirect {
    saved: OwnedFd,
    restored: bool,
    _permit: MutexGuard<'static, ()>,
}

impl StdoutRedirect {
    /// Reinstate the real stdout now instead of at drop time.
    pub(crate) fn restore(mut self) {
        self.restore_in_place();
    }

    fn restore_in_place(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        // Push any buffered callback output into the pipe before the swap back.
        let _ = std::io::stdout().flush();
        // Safety: `saved` is an open duplicate of the original stdout.
        if unsafe { libc::dup2(self.saved.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
            warn!(
                error = %std::io::Error::last_os_error(),
                "failed to restore stdout after capture"
            );
        }
    }
}

impl Drop for StdoutRedirect {
    fn drop(&mut self) {
        self.restore_in_place();
    }
}

/// Acquire the global stdout slot and swap fd 1 into a capture pipe.
///
/// Returns the guard plus the pipe's read end. Waits if another call
/// currently holds the slot.
pub(crate) async fn redirect_stdout() -> Result<(StdoutRedirect, pipe::Receiver), LaunchError> {
    let permit = STDOUT_SLOT.lock().await;
    // Flush so bytes printed before the swap keep their original destination.
    let _ = std::io::stdout().flush();

    let mut fds = [0i32; 2];
    // Safety: `fds` is a valid two-element array for the out-parameters.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
        return Err(os_error("pipe"));
    }
    // Safety: both descriptors were just returned by pipe() and are owned here.
    let read_end = unsafe { OwnedFd::from_raw_fd(fds[0]) };
    let write_end = unsafe { OwnedFd::from_raw_fd(fds[1]) };

    // Safety: STDOUT_FILENO is valid for the life of the process.
    let saved_raw = unsafe { libc::dup(libc::STDOUT_FILENO) };
    if saved_raw < 0 {
        return Err(os_error("dup"));
    }
    // Safety: `saved_raw` was just returned by dup() and is owned here.
    let saved = unsafe { OwnedFd::from_raw_fd(saved_raw) };

    // Safety: `write_end` is open; on success fd 1 refers to the pipe.
    if unsafe { libc::dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
        return Err(os_error("dup2"));
    }
    // fd 1 keeps the write side open from here on.
    drop(write_end);

    match pipe::Receiver::from_owned_fd(read_end) {
        Ok(receiver) => Ok((
            StdoutRedirect {
                saved,
                restored: false,
                _permit: permit,
            },
            receiver,
        )),
        Err(e) => {
            // Nothing will ever drain the pipe; undo the swap before failing.
            // Safety: `saved` is an open duplicate of the original stdout.
            unsafe { libc::dup2(saved.as_raw_fd(), libc::STDOUT_FILENO) };
            Err(LaunchError::RedirectFailed {
                reason: format!("pipe receiver registration: {e}"),
            })
        }
    }
}

fn os_error(op: &str) -> LaunchError {
    LaunchError::RedirectFailed {
        reason: format!("{op}: {}", std::io::Error::last_os_error()),
    }
}
