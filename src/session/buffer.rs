//! Growing output capture buffer with one-shot pattern detection.
//!
//! A buffer has exactly one writer (the pump draining a process pipe) and any
//! number of readers. Searches never consume data, so asking whether a line
//! has appeared is idempotent.

use bytes::{Bytes, BytesMut};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Shared, append-only byte buffer.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    data: BytesMut,
    watches: Vec<Watch>,
    closed: bool,
}

#[derive(Debug)]
struct Watch {
    pattern: Vec<u8>,
    tx: oneshot::Sender<()>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a chunk and fire every watch whose pattern now appears.
    ///
    /// Writes after [`close`](Self::close) are dropped.
    pub fn append(&self, chunk: &[u8]) {
        let mut inner = self.lock();
        if inner.closed || chunk.is_empty() {
            return;
        }

        let previous_len = inner.data.len();
        inner.data.extend_from_slice(chunk);

        let Inner { data, watches, .. } = &mut *inner;
        let pending = std::mem::take(watches);
        for watch in pending {
            if watch.tx.is_closed() {
                continue;
            }
            // Only the tail can contain a new match: a pattern may straddle
            // the old end, so back up by len - 1 bytes.
            let from = previous_len.saturating_sub(watch.pattern.len().saturating_sub(1));
            if contains(&data[from..], &watch.pattern) {
                let _ = watch.tx.send(());
            } else {
                watches.push(watch);
            }
        }
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock().data)
    }

    /// Contents decoded lossily as UTF-8.
    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.lock().data).into_owned()
    }

    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Has `pattern` ever appeared in the buffer.
    pub fn contains(&self, pattern: &str) -> bool {
        contains(&self.lock().data, pattern.as_bytes())
    }

    /// Arm a one-shot watch for `pattern`.
    ///
    /// The returned [`Detection`] resolves `true` as soon as the pattern is
    /// present (immediately, if it already is) and `false` if the buffer is
    /// closed without it ever appearing. Arm the watch before starting the
    /// writer so a match emitted right away cannot be missed.
    pub fn detect(&self, pattern: impl Into<String>) -> Detection {
        let pattern = pattern.into().into_bytes();
        let (tx, rx) = oneshot::channel();

        let mut inner = self.lock();
        if contains(&inner.data, &pattern) {
            let _ = tx.send(());
        } else if !inner.closed {
            inner.watches.push(Watch { pattern, tx });
        }

        Detection { rx }
    }

    /// Mark end of stream. Outstanding watches resolve `false`.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.watches.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl io::Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Pending result of [`OutputBuffer::detect`].
#[derive(Debug)]
pub struct Detection {
    rx: oneshot::Receiver<()>,
}

impl Detection {
    /// Wait for the pattern. Returns `false` if the stream ended without it.
    pub async fn detected(self) -> bool {
        self.rx.await.is_ok()
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}
