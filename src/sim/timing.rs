//! Random timing for variable micro-steps.
//!
//! Some steps of interrupt handling (saving context, running an ISR, transferring data)
//! take a variable amount of time. Every such duration is drawn through a single [`DurationSource`],
//! which is passed explicitly into the simulator so that it can be seeded or replaced.
//!
//! The simulator creates its own source from [`SimFlags::timing`] (see [`TimingStrategy`]),
//! but any `DurationSource` can be supplied with [`Simulator::run_with`].
//!
//! [`SimFlags::timing`]: super::SimFlags::timing
//! [`Simulator::run_with`]: super::Simulator::run_with

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;

/// A source of durations for randomly-timed steps.
pub trait DurationSource {
    /// Draws a duration (in ms) from the inclusive range `lo..=hi`.
    ///
    /// If `hi < lo`, this should return `lo`.
    fn draw(&mut self, lo: u64, hi: u64) -> u64;
}
impl DurationSource for StdRng {
    /// Draws uniformly from the range.
    ///
    /// This can be used to create deterministic, seeded durations.
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        match lo < hi {
            true  => self.gen_range(lo..=hi),
            false => lo,
        }
    }
}
impl DurationSource for u64 {
    /// Always picks the given value, clamped into the range.
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        (*self).clamp(lo, hi.max(lo))
    }
}
impl DurationSource for VecDeque<u64> {
    /// Pops scripted durations in order, clamping each into the requested range.
    ///
    /// Once the script runs out, the low end of the range is picked.
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        match self.pop_front() {
            Some(mut v) => v.draw(lo, hi),
            None => lo,
        }
    }
}
impl<S: DurationSource + ?Sized> DurationSource for &mut S {
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        (**self).draw(lo, hi)
    }
}
impl<S: DurationSource + ?Sized> DurationSource for Box<S> {
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        (**self).draw(lo, hi)
    }
}

/// Strategy used to draw the durations of randomly-timed steps.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum TimingStrategy {
    /// Draws each duration randomly and non-deterministically.
    #[default]
    Unseeded,

    /// Draws each duration randomly and deterministically.
    Seeded {
        /// The seed the RNG is initialized with.
        seed: u64
    },

    /// Always picks a known value (clamped into each step's range).
    Known {
        /// The value to pick.
        value: u64
    }
}
impl TimingStrategy {
    /// Creates the duration source for a run.
    pub fn generator(&self) -> TimingGenerator {
        use rand::SeedableRng;

        match *self {
            TimingStrategy::Unseeded => TimingGenerator::Random(Box::new(StdRng::from_entropy())),
            TimingStrategy::Seeded { seed } => TimingGenerator::Random(Box::new(StdRng::seed_from_u64(seed))),
            TimingStrategy::Known { value } => TimingGenerator::Known(value),
        }
    }
}

/// The duration source created by a [`TimingStrategy`].
#[derive(Debug)]
pub enum TimingGenerator {
    /// Draws from an RNG.
    Random(Box<StdRng>),
    /// Always picks a known value.
    Known(u64)
}
impl DurationSource for TimingGenerator {
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        match self {
            TimingGenerator::Random(r) => r.draw(lo, hi),
            TimingGenerator::Known(k)  => k.draw(lo, hi),
        }
    }
}
