//! Recent output retained per server.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use gamesrv_core::OutputLine;

/// Maximum number of output lines kept per server
pub const MAX_OUTPUT_LINES: usize = 500;

/// Ring buffer of the most recent child output.
///
/// Shared between the supervisor and its stream reader tasks. Survives
/// restarts so the tail of a crashed run can still be inspected.
#[derive(Debug, Clone)]
pub struct OutputLog {
    lines: Arc<RwLock<VecDeque<OutputLine>>>,
    capacity: usize,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_OUTPUT_LINES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, dropping the oldest if at capacity
    pub fn push(&self, line: OutputLine) {
        let mut lines = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        if lines.len() >= self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// The newest `limit` lines, oldest first
    pub fn tail(&self, limit: usize) -> Vec<OutputLine> {
        let lines = self.lines.read().unwrap_or_else(PoisonError::into_inner);
        let skip = lines.len().saturating_sub(limit);
        lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamesrv_core::OutputStream;

    #[test]
    fn drops_oldest_at_capacity() {
        let log = OutputLog::with_capacity(3);
        for i in 0..5 {
            log.push(OutputLine::new(OutputStream::Stdout, format!("line {i}")));
        }
        let texts: Vec<String> = log.tail(10).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, ["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn tail_returns_newest_in_order() {
        let log = OutputLog::new();
        for i in 0..4 {
            log.push(OutputLine::new(OutputStream::Stderr, format!("{i}")));
        }
        let texts: Vec<String> = log.tail(2).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, ["2", "3"]);
        assert_eq!(log.len(), 4);
    }
}
