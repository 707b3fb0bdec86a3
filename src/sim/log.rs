//! The execution log produced by the simulator.
//!
//! Each micro-step of an activity becomes one [`LogRecord`].
//! A record is written out as one line of the form
//! `<timestamp>, <duration>, <description>`:
//!
//! ```text
//! 0, 10, CPU execution
//! 10, 1, switch to kernel mode
//! 11, 2, context saved
//! 13, 1, find vector 1 in memory position 0x0000
//! ```
//!
//! The simulator only builds records. Persisting them is done with [`write_log`]
//! (or any other consumer of the records).

use std::io::Write;

use super::recipe::{Category, MicroOp};

/// One line of the execution log.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LogRecord {
    /// The simulated time (in ms) the step started at.
    pub timestamp: u64,
    /// The time (in ms) the step took.
    pub duration: u64,
    /// The micro-step this record describes.
    pub op: MicroOp,
    /// The human-readable label of the step.
    pub description: String
}
impl LogRecord {
    /// Creates a new record for the given micro-step.
    pub fn new(timestamp: u64, duration: u64, op: MicroOp, description: impl Into<String>) -> Self {
        Self { timestamp, duration, op, description: description.into() }
    }

    /// The simulated time (in ms) the step ended at.
    pub fn end(&self) -> u64 {
        self.timestamp.saturating_add(self.duration)
    }

    /// The category this record's time is accounted under.
    pub fn category(&self) -> Category {
        self.op.category()
    }
}
impl std::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.timestamp, self.duration, self.description)
    }
}

/// Writes each record on its own line.
pub fn write_log<'a>(records: impl IntoIterator<Item=&'a LogRecord>, mut out: impl Write) -> std::io::Result<()> {
    for record in records {
        writeln!(out, "{record}")?;
    }
    out.flush()
}
