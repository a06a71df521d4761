//! Output sinks for console text.
//!
//! Every line a command produces goes through an [`OutputSink`]. The binary
//! uses [`StdoutSink`]; tests use [`MockSink`], which captures lines for
//! later assertion.
//!
//! # Example
//!
//! ```
//! use cellhost::output::{MockSink, OutputSink};
//!
//! let sink = MockSink::new();
//! let mut writer = sink.clone();
//! writer.print("success successful");
//! assert_eq!(sink.lines(), vec!["success successful".to_string()]);
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Destination for console output, one logical line at a time.
pub trait OutputSink: Send {
    /// Write a single line.
    fn print(&mut self, line: &str);
}

/// Writes lines to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn print(&mut self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

/// Captures printed lines for testing.
///
/// Clones share the same buffer, so a test can keep one clone while the
/// server owns another.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MockSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of all captured lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Get the most recent line, if any.
    pub fn last(&self) -> Option<String> {
        self.lines.lock().ok().and_then(|l| l.last().cloned())
    }

    /// Drop all captured lines.
    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }
}

impl OutputSink for MockSink {
    fn print(&mut self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
