//! Integration tests for proc_run.
//!
//! These tests exercise the full plan/launch/race/reconcile flow with real
//! `/bin/sh` children and real callback workers.

#![cfg(unix)]

use proc_run::{run, run_sync, CaptureBuffer, RunRequest, RunStatus, NO_RETURN_CODE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Write directly to fd 1, bypassing the test harness's thread-local stdout
/// hook, so callback output demonstrably travels through the capture swap.
fn print_fd1(text: &str) {
    let bytes = text.as_bytes();
    // Safety: the pointer/length pair describes a live slice.
    let written = unsafe { libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len()) };
    assert_eq!(written, bytes.len() as isize);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_empty_request_rejected() {
    let result = run(RunRequest::empty()).await;
    assert_eq!(result.status, RunStatus::BadParameter);
    assert_eq!(result.return_code, NO_RETURN_CODE);
}

#[tokio::test]
async fn test_empty_command_is_shell_noop() {
    // Empty text is still a command; the interpreter accepts it and exits 0.
    let result = run(RunRequest::command("")).await;
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 0);
}

#[tokio::test]
async fn test_rejection_leaves_buffer_untouched() {
    let mut buf = CaptureBuffer::with_capacity(16);
    let result = run(RunRequest::empty().capture(&mut buf)).await;
    assert_eq!(result.status, RunStatus::BadParameter);
    assert!(buf.as_bytes_with_nul().is_empty());
}

// =============================================================================
// External commands
// =============================================================================

#[tokio::test]
async fn test_echo_capture() {
    let mut buf = CaptureBuffer::with_capacity(64);
    let result = run(RunRequest::command("echo test").capture(&mut buf)).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 0);
    assert_eq!(buf.as_bytes(), b"test\n");
    assert_eq!(buf.as_bytes_with_nul(), b"test\n\0");
    assert!(!buf.is_truncated());
}

#[tokio::test]
async fn test_exit_code_reported() {
    let result = run(RunRequest::command("exit 41")).await;
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 41);
}

#[tokio::test]
async fn test_non_blocking_returns_invoked_immediately() {
    let start = Instant::now();
    let result = run(RunRequest::command("sleep 2").blocking(false)).await;

    assert_eq!(result.status, RunStatus::Invoked);
    assert_eq!(result.return_code, 0);
    assert!(
        start.elapsed() < Duration::from_secs(1),
        "non-blocking call waited for the child"
    );
}

#[tokio::test]
async fn test_timeout_kills_runaway_child() {
    let start = Instant::now();
    let result = run(RunRequest::command("sleep 5").max_wait(Duration::from_millis(2000))).await;
    let elapsed = start.elapsed();

    assert_eq!(result.status, RunStatus::TimedOut);
    assert_eq!(result.return_code, NO_RETURN_CODE);
    assert!(elapsed >= Duration::from_millis(1900), "returned too early");
    assert!(
        elapsed < Duration::from_millis(4000),
        "call waited out the child instead of killing it"
    );
}

#[tokio::test]
async fn test_completion_within_deadline() {
    let result = run(RunRequest::command("sleep 1").max_wait(Duration::from_millis(2000))).await;
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 0);
}

#[tokio::test]
async fn test_partial_output_preserved_on_timeout() {
    let mut buf = CaptureBuffer::with_capacity(64);
    let result = run(RunRequest::command("echo early; sleep 5")
        .max_wait(Duration::from_millis(500))
        .capture(&mut buf))
    .await;

    assert_eq!(result.status, RunStatus::TimedOut);
    assert_eq!(buf.as_bytes(), b"early\n");
}

#[tokio::test]
async fn test_truncation_to_capacity() {
    let mut buf = CaptureBuffer::with_capacity(5);
    let result = run(RunRequest::command("echo 123456789").capture(&mut buf)).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(buf.as_bytes(), b"1234");
    assert_eq!(buf.as_bytes_with_nul().len(), 5);
    assert!(buf.is_truncated());
}

#[tokio::test]
async fn test_capture_of_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.txt");
    std::fs::write(&path, "alpha\nbeta\n").unwrap();

    let mut buf = CaptureBuffer::with_capacity(64);
    let result = run(RunRequest::command(format!("cat {}", path.display())).capture(&mut buf)).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(buf.as_bytes(), b"alpha\nbeta\n");
}

#[tokio::test]
async fn test_blocking_without_buffer_discards_output() {
    // Well past the 64 KiB pipe buffer; hangs unless the channel keeps
    // draining with no destination attached.
    let result = run(RunRequest::command("head -c 1000000 /dev/zero")
        .max_wait(Duration::from_secs(10)))
    .await;
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 0);
}

#[tokio::test]
async fn test_capture_ignored_when_non_blocking() {
    let mut buf = CaptureBuffer::with_capacity(32);
    let result = run(RunRequest::command("echo ignored")
        .blocking(false)
        .capture(&mut buf))
    .await;

    assert_eq!(result.status, RunStatus::Invoked);
    assert!(buf.as_bytes_with_nul().is_empty());
}

// =============================================================================
// In-process callbacks
// =============================================================================

#[tokio::test]
async fn test_callback_capture_and_exit_value() {
    let mut buf = CaptureBuffer::with_capacity(64);
    let result = run(RunRequest::callback(|_argv| {
        print_fd1("from callback\n");
        255
    })
    .capture(&mut buf))
    .await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 255);
    assert_eq!(buf.as_bytes(), b"from callback\n");
}

#[tokio::test]
async fn test_callback_takes_precedence_over_command() {
    let mut buf = CaptureBuffer::with_capacity(64);
    let result = run(RunRequest::callback(|argv| {
        assert_eq!(argv, &["echo", "not-run"]);
        7
    })
    .label("echo not-run")
    .capture(&mut buf))
    .await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 7);
    // The command text served as labels only; nothing was echoed.
    assert!(buf.as_bytes().is_empty());
}

#[tokio::test]
async fn test_callback_panic_is_failure() {
    let result = run(RunRequest::callback(|_argv| panic!("worker bug"))).await;
    assert_eq!(result.status, RunStatus::Failure);
    assert_eq!(result.return_code, NO_RETURN_CODE);
}

#[tokio::test]
async fn test_callback_timeout_abandons_worker() {
    let start = Instant::now();
    let result = run(RunRequest::callback(|_argv| {
        std::thread::sleep(Duration::from_secs(5));
        0
    })
    .max_wait(Duration::from_millis(500)))
    .await;

    assert_eq!(result.status, RunStatus::TimedOut);
    assert_eq!(result.return_code, NO_RETURN_CODE);
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_non_blocking_callback_hand_off() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);

    let result = run(RunRequest::callback(move |_argv| {
        flag.store(true, Ordering::SeqCst);
        0
    })
    .blocking(false))
    .await;

    assert_eq!(result.status, RunStatus::Invoked);
    assert_eq!(result.return_code, 0);

    // The detached worker still runs to completion on its own.
    let deadline = Instant::now() + Duration::from_secs(2);
    while !ran.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "detached callback never ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_sequential_callbacks_leave_no_residual_redirection() {
    for round in 0..2 {
        let mut buf = CaptureBuffer::with_capacity(32);
        let result = run(RunRequest::callback(move |_argv| {
            print_fd1("captured\n");
            round
        })
        .capture(&mut buf))
        .await;

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.return_code, round);
        assert_eq!(buf.as_bytes(), b"captured\n");
    }
}

// =============================================================================
// Independence and the sync wrapper
// =============================================================================

#[tokio::test]
async fn test_reused_buffer_resets_between_calls() {
    let mut buf = CaptureBuffer::with_capacity(64);

    let first = run(RunRequest::command("echo first-longer-line").capture(&mut buf)).await;
    assert_eq!(first.status, RunStatus::Success);
    assert_eq!(buf.as_bytes(), b"first-longer-line\n");

    let second = run(RunRequest::command("echo second").capture(&mut buf)).await;
    assert_eq!(second.status, RunStatus::Success);
    assert_eq!(buf.as_bytes(), b"second\n");
}

#[test]
fn test_run_sync_outside_runtime() {
    let mut buf = CaptureBuffer::with_capacity(32);
    let result = run_sync(RunRequest::command("echo sync").capture(&mut buf));

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 0);
    assert_eq!(buf.as_bytes(), b"sync\n");
}

#[test]
fn test_run_sync_non_blocking_callback_returns_at_hand_off() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&ran);

    let start = Instant::now();
    let result = run_sync(
        RunRequest::callback(move |_argv| {
            std::thread::sleep(Duration::from_secs(1));
            flag.store(true, Ordering::SeqCst);
            0
        })
        .blocking(false),
    );

    // Hand-off must not wait out the callback, even though the throwaway
    // runtime behind run_sync is torn down before returning.
    assert_eq!(result.status, RunStatus::Invoked);
    assert_eq!(result.return_code, 0);
    assert!(
        start.elapsed() < Duration::from_millis(500),
        "fire-and-forget call blocked for {:?}",
        start.elapsed()
    );

    // The detached worker still runs to completion on its own.
    let deadline = Instant::now() + Duration::from_secs(3);
    while !ran.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "detached callback never ran");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_sync_inside_runtime() {
    let result = run_sync(RunRequest::command("exit 3"));
    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.return_code, 3);
}
