//! Destinations for encoded records

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Something that durably emits encoded records.
///
/// Each `write` receives exactly one encoded record and must emit it whole:
/// concurrent writers may never interleave partial records.
pub trait Sink: Send + Sync + 'static {
    /// Emit one encoded record
    fn write(&self, buf: &[u8]) -> io::Result<()>;

    /// Flush any buffered output
    fn flush(&self) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        (**self).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Adapts any writer into a sink, serializing access through a lock
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send + 'static> WriterSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send + 'static> Sink for WriterSink<W> {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        self.writer.lock().write_all(buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

/// Fans one record out to several sinks.
///
/// Every sink is attempted; the first failure is returned.
#[derive(Clone, Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    /// Create from a list of sinks
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Add a sink
    pub fn push(&mut self, sink: Arc<dyn Sink>) {
        self.sinks.push(sink);
    }

    /// Number of attached sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are attached
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Sink for MultiSink {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        let mut first = Ok(());
        for sink in &self.sinks {
            if let Err(e) = sink.write(buf)
                && first.is_ok()
            {
                first = Err(e);
            }
        }
        first
    }

    fn flush(&self) -> io::Result<()> {
        let mut first = Ok(());
        for sink in &self.sinks {
            if let Err(e) = sink.flush()
                && first.is_ok()
            {
                first = Err(e);
            }
        }
        first
    }
}

/// Sink that keeps everything written to it in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    buf: Mutex<Vec<u8>>,
}

impl MemorySink {
    /// Create an empty memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Written records, one per line
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Check if any written record contains the text
    pub fn contains(&self, text: &str) -> bool {
        self.contents().contains(text)
    }

    /// Number of bytes written
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    /// Discard captured output
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        self.buf.lock().extend_from_slice(buf);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
