//! Line buffering for console input.

use super::command::Command;
use crate::splitter;

/// One unit of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A `/` command line.
    Command(String),
    /// Query text to submit as one run.
    Block(String),
}

/// Accumulates typed lines into submittable blocks.
///
/// A block is complete when a line ends with `;` (but not `;\`) or when a
/// blank line follows non-empty input. Neither counts while a quoted run is
/// still open. Command lines are recognized only between blocks, so a `/`
/// inside a multi-line statement stays query text.
#[derive(Debug, Default)]
pub struct BlockBuffer {
    lines: Vec<String>,
}

impl BlockBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a block is partially typed.
    pub fn is_pending(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Feeds one line (without its line break).
    pub fn push_line(&mut self, line: &str) -> Option<Input> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if self.lines.is_empty() {
            if line.trim().is_empty() {
                return None;
            }
            if Command::is_command(line) {
                return Some(Input::Command(line.trim().to_string()));
            }
        }

        if line.trim().is_empty() {
            if self.in_quote() {
                self.lines.push(line.to_string());
                return None;
            }
            return self.take();
        }

        self.lines.push(line.to_string());
        if line.trim_end().ends_with(';') && !self.in_quote() {
            return self.take();
        }
        None
    }

    fn in_quote(&self) -> bool {
        splitter::ends_open_quote(&self.lines.join("\n"))
    }

    /// Returns whatever is buffered, for end of input.
    pub fn finish(&mut self) -> Option<Input> {
        self.take()
    }

    fn take(&mut self) -> Option<Input> {
        if self.lines.is_empty() {
            return None;
        }
        let block = std::mem::take(&mut self.lines).join("\n");
        Some(Input::Block(block))
    }
}
