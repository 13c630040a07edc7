//! Runtime errors: type mismatches, arithmetic failures, and control-flow
//! faults, each anchored at the program line where they were detected.

use std::error::Error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    message: String,
    line: usize,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error during execution: Line {}: {}", self.line, self.message)
    }
}

impl Error for RuntimeError {}
