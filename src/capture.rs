//! Output capture channel.
//!
//! [`CaptureBuffer`] is the caller-owned, fixed-capacity destination for a
//! unit of work's stdout. [`CaptureSink`] is the crate-internal drain that
//! mirrors the work's output stream into it: bytes beyond capacity are
//! discarded, the stream is always read to EOF so the child never blocks on a
//! full pipe, and the buffer is NUL-finalized before any result is returned.

use std::borrow::Cow;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read-loop chunk size, shared with the child-stdout drain.
const DRAIN_CHUNK: usize = 8192;

/// Fixed-capacity byte sink for captured stdout.
///
/// Holds at most `capacity - 1` payload bytes; one slot is reserved for a
/// terminating NUL byte written when the capture is finalized, so a non-empty
/// capacity always yields a NUL-terminated region. Accessors follow the
/// `CStr` convention: [`as_bytes`](Self::as_bytes) excludes the terminator,
/// [`as_bytes_with_nul`](Self::as_bytes_with_nul) includes it.
#[derive(Debug, Clone)]
pub struct CaptureBuffer {
    data: Vec<u8>,
    capacity: usize,
    truncated: bool,
    finalized: bool,
}

impl CaptureBuffer {
    /// Create a buffer holding up to `capacity` bytes including the
    /// terminating NUL.
    ///
    /// A zero capacity is permitted; such a buffer never stores anything,
    /// not even the terminator.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            truncated: false,
            finalized: false,
        }
    }

    /// Total capacity including the reserved NUL slot.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Captured payload bytes, excluding the NUL terminator.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.data.len() - usize::from(self.finalized);
        &self.data[..end]
    }

    /// Captured bytes including the NUL terminator (empty before any
    /// finalized capture).
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.data
    }

    /// Captured payload as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// Whether output was discarded because the buffer filled up.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Number of captured payload bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether no payload bytes were captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all captured state, making the buffer reusable.
    pub fn reset(&mut self) {
        self.data.clear();
        self.truncated = false;
        self.finalized = false;
    }

    /// Append a chunk, keeping one slot free for the terminator.
    ///
    /// Bytes that do not fit are discarded and the truncation flag is set.
    fn push_chunk(&mut self, chunk: &[u8]) {
        debug_assert!(!self.finalized);
        let room = self.capacity.saturating_sub(1);
        let remaining = room.saturating_sub(self.data.len());
        if chunk.len() > remaining {
            self.truncated = true;
        }
        let take = chunk.len().min(remaining);
        self.data.extend_from_slice(&chunk[..take]);
    }

    /// Write the NUL terminator. Idempotent; a no-op at zero capacity.
    fn finalize(&mut self) {
        if self.capacity > 0 && !self.finalized {
            self.data.push(0);
            self.finalized = true;
        }
    }
}

/// Drain side of the capture channel for one blocking call.
///
/// Wraps the request's optional buffer; with no buffer attached it still
/// reads the stream to EOF and discards everything.
pub(crate) struct CaptureSink<'buf> {
    buffer: Option<&'buf mut CaptureBuffer>,
}

impl<'buf> CaptureSink<'buf> {
    /// Take ownership of the caller's buffer for the span of one call,
    /// resetting any previous contents.
    pub(crate) fn attach(buffer: Option<&'buf mut CaptureBuffer>) -> Self {
        let mut sink = Self { buffer };
        if let Some(buf) = sink.buffer.as_deref_mut() {
            buf.reset();
        }
        sink
    }

    /// Mirror `reader` into the buffer until EOF.
    ///
    /// Overflow is discarded, never buffered; the reader is consumed fully
    /// either way so the writing side cannot stall on a full pipe.
    pub(crate) async fn drain_from<R>(&mut self, reader: &mut R) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = [0u8; DRAIN_CHUNK];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    if let Some(buf) = self.buffer.as_deref_mut() {
                        buf.push_chunk(&chunk[..n]);
                    }
                }
                Err(e) => break Err(e),
            }
        }
    }

    /// Seal the capture. Runs on every blocking exit path, including
    /// failures and timeouts, before the result is reconciled.
    pub(crate) fn finish(&mut self) {
        if let Some(buf) = self.buffer.as_deref_mut() {
            buf.finalize();
        }
    }
}
