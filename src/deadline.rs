//! Deadline monitor.
//!
//! Races a unit of work against an optional wall-clock limit. The race is a
//! single decision point fed by two notifications (work completion and timer
//! expiry), not a poll loop; whichever fires first wins and the loser is
//! dropped. Polling the work future first makes completion win a tie.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Outcome of racing a unit of work against its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Waited<T> {
    /// The work finished before any deadline.
    Completed(T),
    /// The deadline elapsed first; the work future was dropped un-finished.
    Expired,
}

/// Await `work`, bounded by `max_wait`.
///
/// `None` and a zero duration both mean wait indefinitely. On expiry the work
/// future is dropped; actually terminating the abandoned work (killing the
/// child, restoring stdout) is the caller's job since it holds the handles.
pub(crate) async fn race<F>(work: F, max_wait: Option<Duration>) -> Waited<F::Output>
where
    F: Future,
{
    match effective(max_wait) {
        None => Waited::Completed(work.await),
        Some(limit) => {
            tokio::select! {
                biased;
                out = work => Waited::Completed(out),
                _ = sleep(limit) => Waited::Expired,
            }
        }
    }
}

/// Normalize the request field: zero means "no deadline".
fn effective(max_wait: Option<Duration>) -> Option<Duration> {
    max_wait.filter(|limit| !limit.is_zero())
}
