//! Process execution request.

use crate::capture::CaptureBuffer;
use std::time::Duration;

/// Callback executed in-process as if it were a child process.
///
/// Receives argv-style labels derived from the request's command text and
/// returns an exit value, mirroring a child's exit code.
pub type RunCallback = Box<dyn FnOnce(&[String]) -> i32 + Send + 'static>;

/// One unit of work to execute.
///
/// A request is consumed by a single call to [`crate::run`] or
/// [`crate::run_sync`]; the optional capture borrow makes it single-use by
/// construction.
pub struct RunRequest<'buf> {
    /// Command line handed verbatim to the platform command interpreter.
    ///
    /// When a callback is also set, this text is not executed; it only
    /// provides the callback's argv labels.
    pub command: Option<String>,

    /// In-process callback executed instead of spawning a child.
    ///
    /// Takes precedence over `command` when both are set.
    pub callback: Option<RunCallback>,

    /// Whether to wait for the work to finish.
    ///
    /// `false` returns immediately after hand-off with
    /// [`crate::RunStatus::Invoked`]. Default: `true`.
    pub blocking: bool,

    /// Request privilege elevation before launch.
    ///
    /// Only meaningful for external commands. Default: `false`.
    pub privileged: bool,

    /// Maximum wall-clock wait before the work is forcibly terminated.
    ///
    /// Only meaningful when `blocking` is set. `None` or a zero duration
    /// waits indefinitely.
    pub max_wait: Option<Duration>,

    /// Caller-owned destination for the work's captured stdout.
    ///
    /// Only consulted when `blocking` is set. Reset when the call attaches
    /// it, truncated to fit, and NUL-finalized on every blocking exit path.
    pub capture: Option<&'buf mut CaptureBuffer>,
}

impl<'buf> RunRequest<'buf> {
    /// Create a request that runs an external command line.
    pub fn command(line: impl Into<String>) -> Self {
        Self {
            command: Some(line.into()),
            ..Self::empty()
        }
    }

    /// Create a request that runs an in-process callback.
    pub fn callback(func: impl FnOnce(&[String]) -> i32 + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(func)),
            ..Self::empty()
        }
    }

    /// Create a request with nothing to run.
    ///
    /// Useful as a starting point when fields are filled in separately;
    /// running it as-is is rejected with [`crate::RunStatus::BadParameter`].
    pub fn empty() -> Self {
        Self {
            command: None,
            callback: None,
            blocking: true,
            privileged: false,
            max_wait: None,
            capture: None,
        }
    }

    /// Set whether the call waits for completion.
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Request privilege elevation at launch.
    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    /// Set the maximum wall-clock wait. A zero duration waits indefinitely.
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Attach a caller-owned capture buffer for the work's stdout.
    pub fn capture(mut self, buffer: &'buf mut CaptureBuffer) -> Self {
        self.capture = Some(buffer);
        self
    }

    /// Set the argv label text for a callback request.
    ///
    /// Equivalent to setting `command` on a callback request: the text is
    /// whitespace-split into the labels handed to the callback.
    pub fn label(mut self, text: impl Into<String>) -> Self {
        self.command = Some(text.into());
        self
    }
}

impl std::fmt::Debug for RunRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("command", &self.command)
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .field("blocking", &self.blocking)
            .field("privileged", &self.privileged)
            .field("max_wait", &self.max_wait)
            .field("capture", &self.capture.as_ref().map(|b| b.capacity()))
            .finish()
    }
}
