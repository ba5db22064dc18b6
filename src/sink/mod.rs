//! Line-oriented output sinks
//!
//! The producer never writes to a terminal or file directly; it hands
//! finished lines to a [`LineSink`]. This keeps TAP formatting independent
//! from where the stream ends up.

use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

mod memory;

pub use memory::MemorySink;

/// Destination for complete lines of output
pub trait LineSink {
    /// Write one line; the sink adds the line terminator.
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Flush anything buffered.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink writing to the process's stdout or stderr
pub struct ConsoleSink {
    inner: Box<dyn Write>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        ConsoleSink {
            inner: Box::new(io::stdout()),
        }
    }

    pub fn stderr() -> Self {
        ConsoleSink {
            inner: Box::new(io::stderr()),
        }
    }
}

impl LineSink for ConsoleSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.inner, "{}", line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Sink appending to a file, creating it if needed
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileSink {
            writer: BufWriter::new(file),
        })
    }
}

impl LineSink for FileSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LineSink for NullSink {
    fn write_line(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }
}

/// Sink copying every line to several others
pub struct TeeSink {
    sinks: Vec<Box<dyn LineSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Box<dyn LineSink>>) -> Self {
        TeeSink { sinks }
    }
}

impl LineSink for TeeSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        for sink in &mut self.sinks {
            sink.write_line(line)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.tap");
        fs::write(&path, "existing\n").unwrap();

        let mut sink = FileSink::append(&path).unwrap();
        sink.write_line("ok 1 - first").unwrap();
        sink.flush().unwrap();
        drop(sink);

        let mut sink = FileSink::append(&path).unwrap();
        sink.write_line("ok 2 - second").unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "existing\nok 1 - first\nok 2 - second\n");
    }

    #[test]
    fn test_null_sink() {
        let mut sink = NullSink;
        sink.write_line("anything").unwrap();
        sink.flush().unwrap();
    }

    #[test]
    fn test_tee_sink() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let mut tee = TeeSink::new(vec![Box::new(first.clone()), Box::new(second.clone())]);

        tee.write_line("TAP version 13").unwrap();
        tee.write_line("1..1").unwrap();

        assert_eq!(first.lines(), vec!["TAP version 13", "1..1"]);
        assert_eq!(second.lines(), first.lines());
    }
}
