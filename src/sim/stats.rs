//! Summaries of where simulated time went.
//!
//! [`Usage`] splits the total time of a log into CPU execution, I/O servicing,
//! and interrupt-handling overhead.

use serde::Serialize;

use super::log::LogRecord;
use super::recipe::Category;

/// Time spent per [`Category`] over a log.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct Usage {
    /// Time (in ms) spent executing user code.
    pub cpu: u64,
    /// Time (in ms) spent servicing I/O devices.
    pub io: u64,
    /// Time (in ms) spent on interrupt-handling overhead.
    pub overhead: u64
}
impl Usage {
    /// Totals the time of each category over the given records.
    pub fn from_records<'a>(records: impl IntoIterator<Item=&'a LogRecord>) -> Self {
        records.into_iter().fold(Usage::default(), |mut usage, r| {
            let slot = match r.category() {
                Category::Cpu      => &mut usage.cpu,
                Category::Io       => &mut usage.io,
                Category::Overhead => &mut usage.overhead,
            };
            *slot = slot.saturating_add(r.duration);
            usage
        })
    }

    /// The total time (in ms).
    pub fn total(&self) -> u64 {
        self.cpu.saturating_add(self.io).saturating_add(self.overhead)
    }

    fn ratio(&self, part: u64) -> f64 {
        match self.total() {
            0 => 0.,
            t => part as f64 / t as f64,
        }
    }
    /// The fraction of time spent executing user code (0 if no time passed).
    pub fn cpu_ratio(&self) -> f64 {
        self.ratio(self.cpu)
    }
    /// The fraction of time spent servicing I/O (0 if no time passed).
    pub fn io_ratio(&self) -> f64 {
        self.ratio(self.io)
    }
    /// The fraction of time spent on overhead (0 if no time passed).
    pub fn overhead_ratio(&self) -> f64 {
        self.ratio(self.overhead)
    }

    /// A JSON object with the totals and ratios.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "cpu_usage": self.cpu,
            "io_activities": self.io,
            "overhead": self.overhead,
            "total_time": self.total(),
            "cpu_ratio": self.cpu_ratio(),
            "io_ratio": self.io_ratio(),
            "overhead_ratio": self.overhead_ratio(),
        })
    }
}
impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "CPU Usage: {} ms", self.cpu)?;
        writeln!(f, "I/O Activities: {} ms", self.io)?;
        writeln!(f, "Overhead: {} ms", self.overhead)?;
        writeln!(f, "Total Time: {} ms", self.total())?;
        writeln!(f, "CPU Usage Ratio: {:.2}%", self.cpu_ratio() * 100.)?;
        writeln!(f, "I/O Activities Ratio: {:.2}%", self.io_ratio() * 100.)?;
        write!(f, "Overhead Ratio: {:.2}%", self.overhead_ratio() * 100.)
    }
}
