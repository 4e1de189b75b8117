//! Console sinks for standard output and standard error

use crate::Sink;
use std::io::{self, Write};

/// Which standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Sink that writes to stdout or stderr.
///
/// Each record is written while holding the stream's lock so records from
/// different threads never interleave.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    stream: ConsoleStream,
}

impl ConsoleSink {
    /// Sink writing to standard output
    pub const fn stdout() -> Self {
        Self {
            stream: ConsoleStream::Stdout,
        }
    }

    /// Sink writing to standard error
    pub const fn stderr() -> Self {
        Self {
            stream: ConsoleStream::Stderr,
        }
    }

    /// The stream this sink writes to
    pub const fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Sink for ConsoleSink {
    fn write(&self, buf: &[u8]) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(buf)?;
                out.flush()
            }
            ConsoleStream::Stderr => io::stderr().lock().write_all(buf),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().lock().flush(),
            ConsoleStream::Stderr => io::stderr().lock().flush(),
        }
    }
}
