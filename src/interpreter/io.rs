//! Injected input/output for the interpreter, so a program run can be driven
//! by real standard streams or, for tests, by in-memory buffers.

use std::io::{self, Write};

/// A source of input lines for `INNUM`/`INSTR`. Returns `None` once the
/// source is exhausted.
pub trait GrinInput {
    fn read_line(&mut self) -> Option<String>;
}

/// A sink for `PRINT` output.
pub trait GrinOutput {
    fn write_line(&mut self, text: &str);
}

/// Reads from real standard input, one line at a time.
pub struct StdinInput {
    lines: io::Lines<io::StdinLock<'static>>,
}

impl StdinInput {
    pub fn new() -> Self {
        Self {
            lines: io::stdin().lines(),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

impl GrinInput for StdinInput {
    fn read_line(&mut self) -> Option<String> {
        self.lines.next()?.ok()
    }
}

/// Writes to real standard output, one line at a time.
#[derive(Default)]
pub struct StdoutOutput;

impl GrinOutput for StdoutOutput {
    fn write_line(&mut self, text: &str) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{text}");
    }
}

/// An in-memory input source backed by a fixed set of lines, useful for
/// deterministic tests.
pub struct BufferInput {
    lines: std::vec::IntoIter<String>,
}

impl BufferInput {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            lines: lines
                .into_iter()
                .map(Into::into)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }

    /// Builds an input source from one multi-line string, split on `\n`.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.lines().map(|l| l.to_string()))
    }
}

impl GrinInput for BufferInput {
    fn read_line(&mut self) -> Option<String> {
        self.lines.next()
    }
}

/// An in-memory output sink that records every printed line, useful for
/// asserting on program output in tests.
#[derive(Debug, Default)]
pub struct BufferOutput {
    pub lines: Vec<String>,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn joined(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("{l}\n"))
            .collect::<String>()
    }
}

impl GrinOutput for BufferOutput {
    fn write_line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

impl<O: GrinOutput + ?Sized> GrinOutput for &mut O {
    fn write_line(&mut self, text: &str) {
        (**self).write_line(text)
    }
}
