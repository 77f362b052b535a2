//! Buffered output channel shared by the dispatcher and the execution
//! context.
//!
//! Commands render output through the channel. Normally bytes pass straight
//! to the caller-supplied sink; while request-level caching is active the
//! dispatcher interposes a capture buffer so the rendered output can be
//! stored before it is flushed. At most one buffer is active at a time —
//! a forward discards the current buffer before delegating — and every exit
//! path of the command loop either commits or discards it.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

struct ChannelState {
    sink: Box<dyn Write + Send>,
    buffer: Option<Vec<u8>>,
}

/// Shared handle over the output sink for one external invocation.
///
/// Clones share the same sink and buffer state.
#[derive(Clone)]
pub struct OutputChannel {
    inner: Arc<Mutex<ChannelState>>,
}

impl OutputChannel {
    /// Creates a channel writing to the given sink.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelState { sink, buffer: None })),
        }
    }

    /// Creates a channel writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a channel that records everything in memory, returning the
    /// channel and a capture handle for inspection.
    #[must_use]
    pub fn capture() -> (Self, OutputCapture) {
        let capture = OutputCapture::default();
        let channel = Self::new(Box::new(capture.clone()));
        (channel, capture)
    }

    /// Writes bytes to the active buffer, or straight to the sink when no
    /// buffer is active.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error, or an error when the channel state is
    /// unusable (poisoned lock).
    pub fn write(&self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.lock()?;
        match state.buffer.as_mut() {
            Some(buffer) => {
                buffer.extend_from_slice(bytes);
                Ok(())
            }
            None => state.sink.write_all(bytes),
        }
    }

    /// Writes a string through [`Self::write`].
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`Self::write`].
    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.write(text.as_bytes())
    }

    /// Starts capturing output. No-op when a buffer is already active.
    pub fn begin_buffering(&self) {
        if let Ok(mut state) = self.inner.lock() {
            if state.buffer.is_none() {
                state.buffer = Some(Vec::new());
            }
        }
    }

    /// Returns `true` while a capture buffer is active.
    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.inner
            .lock()
            .map(|state| state.buffer.is_some())
            .unwrap_or(false)
    }

    /// Ends buffering, flushes the captured bytes to the sink, and returns
    /// them. Returns an empty vector when no buffer was active.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error; the captured bytes are dropped if the
    /// flush fails.
    pub fn commit(&self) -> io::Result<Vec<u8>> {
        let mut state = self.lock()?;
        match state.buffer.take() {
            Some(bytes) => {
                state.sink.write_all(&bytes)?;
                Ok(bytes)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Ends buffering and drops the captured bytes. No-op when no buffer is
    /// active.
    pub fn discard(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.buffer = None;
        }
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, ChannelState>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::other("output channel lock poisoned"))
    }
}

impl std::fmt::Debug for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputChannel")
            .field("buffering", &self.is_buffering())
            .finish()
    }
}

/// In-memory sink for tests and embedders that collect output.
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    data: Arc<Mutex<Vec<u8>>>,
}

impl OutputCapture {
    /// Returns a copy of everything written so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.data.lock().map_or_else(|_| Vec::new(), |d| d.clone())
    }

    /// Returns the captured bytes as a UTF-8 string, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }
}

impl Write for OutputCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| io::Error::other("capture lock poisoned"))?;
        data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
