//! In-memory sink for capturing output

use crate::error::Result;
use crate::sink::LineSink;
use std::cell::RefCell;
use std::rc::Rc;

/// A sink that captures lines in a shared buffer
///
/// Clones share the same buffer, so a test can keep one handle while the
/// producer owns another.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Everything written so far, newline-terminated.
    pub fn contents(&self) -> String {
        self.lines
            .borrow()
            .iter()
            .map(|line| format!("{}\n", line))
            .collect()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl LineSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(())
    }
}
