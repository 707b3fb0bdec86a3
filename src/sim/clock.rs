//! The simulated clock.

use super::SimErr;

/// A monotonically increasing counter of simulated time, in ms.
///
/// The clock starts at 0 and only moves forward by the duration of a step that was just logged.
/// It is `Copy`, so the simulator can advance a scratch copy while expanding an activity
/// and only commit it once every step has been computed.
#[derive(Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct SimClock(u64);
impl SimClock {
    /// Creates a clock at time 0.
    pub fn new() -> Self {
        Self(0)
    }

    /// The current simulated time (in ms).
    pub fn now(&self) -> u64 {
        self.0
    }

    /// Moves the clock forward by `ms`, returning the time before advancing.
    ///
    /// # Errors
    ///
    /// This fails with [`SimErr::TimeOverflow`] (and leaves the clock unchanged)
    /// if the new time does not fit in a `u64`.
    pub fn advance(&mut self, ms: u64) -> Result<u64, SimErr> {
        let start = self.0;
        self.0 = start.checked_add(ms).ok_or(SimErr::TimeOverflow)?;
        Ok(start)
    }

    /// Resets the clock to time 0.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
impl std::fmt::Display for SimClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::SimErr;

    use super::SimClock;

    #[test]
    fn test_advance() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(10), Ok(0));
        assert_eq!(clock.advance(0), Ok(10));
        assert_eq!(clock.advance(5), Ok(10));
        assert_eq!(clock.now(), 15);

        clock.reset();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_overflow() {
        let mut clock = SimClock::new();
        clock.advance(u64::MAX).unwrap();
        assert_eq!(clock.advance(1), Err(SimErr::TimeOverflow));
        assert_eq!(clock.now(), u64::MAX);
    }
}
