//! # Output Buffer
//!
//! File: cli/src/wrapper/buffer.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The ordered log of formatted lines captured by one wrapper instance.
//! Process notifications append to it; every settled call flushes it. A flush
//! takes the whole content under the lock, routes each line through a sink,
//! and leaves the buffer empty, so no line is ever delivered twice and none
//! appended concurrently is lost.
//!
//! ## Sinks
//!
//! A `LineSink` is any `Fn(&str)` shared behind an `Arc`. Wrappers flush
//! through `noop_sink()` unless told otherwise; `tracing_sink()` logs every
//! line at INFO level under the `clapi::output` target.
//!
//! Sinks run after the lines have been taken out and the lock released, so a
//! sink may read or flush the same buffer. Lines from two concurrent flushes
//! can reach the sink interleaved.
//!
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::info;

/// Receives each line as it is flushed out of a buffer.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// A sink that discards every line.
pub fn noop_sink() -> LineSink {
    Arc::new(|_line: &str| {})
}

/// A sink that logs every line through `tracing`.
pub fn tracing_sink() -> LineSink {
    Arc::new(|line: &str| info!(target: "clapi::output", "{}", line))
}

/// Lock-guarded, ordered sequence of captured lines.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    lines: Mutex<Vec<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that starts with a copy of `lines`.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines: Mutex::new(lines),
        }
    }

    /// Appends `lines` after everything already buffered.
    pub fn append(&self, lines: impl IntoIterator<Item = String>) {
        self.lines.lock().extend(lines);
    }

    /// A copy of the current contents; the buffer is left untouched.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    /// Atomically takes every buffered line, then passes each through `sink`.
    pub fn flush(&self, sink: &dyn Fn(&str)) -> Vec<String> {
        let drained = std::mem::take(&mut *self.lines.lock());
        deliver(&drained, sink);
        drained
    }

    /// Holds the lock for multi-step updates that must not interleave with others.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.lines.lock()
    }
}

/// Routes each line through `sink`. Call it with no buffer lock held.
pub(crate) fn deliver(lines: &[String], sink: &dyn Fn(&str)) {
    for line in lines {
        sink(line);
    }
}
