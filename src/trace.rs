//! Plaintext run trace.
//!
//! The multiple-access model can narrate a run one line per happening: slot
//! headers, arrivals, transmissions and collisions. The trace is append-only
//! and has no schema beyond being readable.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Destination for trace lines. Disabled traces discard everything.
pub struct TraceLog {
    sink: Option<Box<dyn Write + Send>>,
    lines: u64,
}

impl TraceLog {
    /// Creates a trace that writes nothing.
    pub fn disabled() -> Self {
        Self { sink: None, lines: 0 }
    }

    /// Creates (truncating) a trace file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::to_writer(BufWriter::new(file)))
    }

    /// Creates a trace over any writer.
    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Some(Box::new(writer)),
            lines: 0,
        }
    }

    /// Returns true if lines are being written somewhere.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Returns the number of lines written.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Appends one line built lazily from `line`.
    ///
    /// The closure is not called when the trace is disabled.
    pub fn line<F>(&mut self, line: F) -> io::Result<()>
    where
        F: FnOnce() -> String,
    {
        if let Some(sink) = self.sink.as_mut() {
            writeln!(sink, "{}", line())?;
            self.lines += 1;
        }
        Ok(())
    }

    /// Flushes buffered lines.
    pub fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for TraceLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceLog")
            .field("enabled", &self.is_enabled())
            .field("lines", &self.lines)
            .finish()
    }
}
