//! Privilege elevation strategy.
//!
//! Elevation is a strategy selected by capability detection at launch time,
//! not a compile-time branch: a platform with no elevation mechanism is the
//! distinct [`Elevation::Unsupported`] strategy rather than a silent alias of
//! the unprivileged path. Missing credentials are not detected here; `sudo`
//! runs non-interactively and a credential failure surfaces through the
//! child's own exit code.

use std::path::PathBuf;
use tokio::process::Command;
use tracing::warn;

#[cfg(unix)]
const INTERPRETER: &str = "/bin/sh";
#[cfg(unix)]
const INTERPRETER_FLAG: &str = "-c";

#[cfg(windows)]
const INTERPRETER: &str = "cmd";
#[cfg(windows)]
const INTERPRETER_FLAG: &str = "/C";

/// How a command line acquires (or fails to acquire) elevated privilege.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Elevation {
    /// No elevation requested; run the interpreter directly.
    Direct,
    /// Prefix the interpreter with a non-interactive `sudo` found on this
    /// system.
    Sudo(PathBuf),
    /// Elevation was requested but this platform offers no mechanism; the
    /// command runs unprivileged (platform-defined fallback).
    Unsupported,
}

impl Elevation {
    /// Pick the strategy for one launch.
    pub(crate) fn detect(privileged: bool) -> Self {
        if !privileged {
            return Elevation::Direct;
        }
        match find_sudo() {
            Some(path) => Elevation::Sudo(path),
            None => {
                warn!("elevation requested but no sudo binary found; running unprivileged");
                Elevation::Unsupported
            }
        }
    }

    /// Program and argument vector for running `line` under this strategy.
    pub(crate) fn command_line(&self, line: &str) -> (PathBuf, Vec<String>) {
        match self {
            Elevation::Direct | Elevation::Unsupported => (
                PathBuf::from(INTERPRETER),
                vec![INTERPRETER_FLAG.to_string(), line.to_string()],
            ),
            Elevation::Sudo(sudo) => (
                sudo.clone(),
                vec![
                    "-n".to_string(),
                    INTERPRETER.to_string(),
                    INTERPRETER_FLAG.to_string(),
                    line.to_string(),
                ],
            ),
        }
    }

    /// Build the interpreter invocation for `line` under this strategy.
    pub(crate) fn shell_command(&self, line: &str) -> Command {
        let (program, args) = self.command_line(line);
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd
    }
}

/// Locate a usable `sudo` binary: `PATH` first, then the conventional
/// locations.
#[cfg(unix)]
fn find_sudo() -> Option<PathBuf> {
    let from_path = std::env::var_os("PATH").and_then(|path| {
        std::env::split_paths(&path)
            .map(|dir| dir.join("sudo"))
            .find(|candidate| is_executable(candidate))
    });
    from_path.or_else(|| {
        ["/usr/bin/sudo", "/bin/sudo"]
            .into_iter()
            .map(PathBuf::from)
            .find(|candidate| is_executable(candidate))
    })
}

#[cfg(not(unix))]
fn find_sudo() -> Option<PathBuf> {
    None
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
