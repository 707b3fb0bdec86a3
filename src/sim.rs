//! Simulating interrupt timing for a trace of activities.
//!
//! This module is focused on expanding parsed activities (i.e., [`Activity`]) into a timed execution log.
//!
//! This module consists of:
//! - [`Simulator`]: The struct that dispatches activities and keeps the simulated clock.
//! - [`vector`]: The module handling the interrupt vector table.
//! - [`recipe`]: The module declaring which micro-steps each kind of activity expands into.
//! - [`timing`]: The module handling the random source for variable step durations.
//! - [`clock`]: The module holding the simulated clock.
//! - [`log`]: The module holding the records of the execution log and writing them out.
//! - [`stats`]: The module summarizing where simulated time went.
//!
//! # Usage
//!
//! To simulate a trace, you need to instantiate a Simulator and run it over a list of activities:
//!
//! ```
//! use irqsim::parse::parse_trace;
//! use irqsim::sim::{Simulator, SimFlags};
//! use irqsim::sim::timing::TimingStrategy;
//!
//! let trace = parse_trace("CPU, 10\nSYSCALL 1, 5\n").unwrap();
//!
//! let mut sim = Simulator::new(SimFlags {
//!     timing: TimingStrategy::Seeded { seed: 2110 },
//!     ..Default::default()
//! });
//! let log = sim.run(&trace).unwrap();
//!
//! assert_eq!(log[0].to_string(), "0, 10, CPU execution");
//! assert_eq!(log[1].to_string(), "10, 1, switch to kernel mode");
//! assert_eq!(log[2].description, "context saved");
//! assert_eq!(log.last().unwrap().description, "IRET");
//! ```
//!
//! ## Flags
//!
//! Here, we define `sim` with a seeded timing strategy, which makes the log reproducible.
//! All of the available flags can be found in [`SimFlags`]:
//! - [`SimFlags::timing`] picks how variable step durations are drawn (see [`TimingStrategy`]),
//! - [`SimFlags::policy`] picks which micro-step recipes are used (see [`DispatchPolicy`]).
//!
//! ## Execution
//!
//! Beyond the basic [`Simulator::run`], there are also:
//! - [`Simulator::run_with`]: runs with a caller-provided [`DurationSource`]
//! - [`Simulator::dispatch`]: dispatches a single activity
//!
//! ```
//! use std::collections::VecDeque;
//! use irqsim::ast::Activity;
//! use irqsim::sim::Simulator;
//!
//! let mut sim = Simulator::new(Default::default());
//!
//! // Scripted durations: context save, ISR, data transfer, error check.
//! let mut durations = VecDeque::<u64>::from([2, 250, 60, 70]);
//! let records = sim.dispatch(&Activity::SystemCall { vect: 1, duration: 5 }, &mut durations).unwrap();
//!
//! assert_eq!(records.len(), 8);
//! assert_eq!(sim.now(), 1 + 2 + 1 + 1 + 250 + 60 + 70 + 1);
//! ```
//!
//! ## Errors
//!
//! Dispatching an interrupt that is not in the vector table fails with [`SimErr::UnknownInterrupt`].
//! A failed activity emits no records and does not move the clock,
//! and [`Simulator::run`] stops at the first failed activity.
//!
//! ```
//! use irqsim::ast::Activity;
//! use irqsim::sim::{Simulator, SimErr};
//!
//! let mut sim = Simulator::new(Default::default());
//! let trace = [
//!     Activity::CpuBurst { duration: 10 },
//!     Activity::SystemCall { vect: 99, duration: 5 },
//!     Activity::CpuBurst { duration: 10 },
//! ];
//!
//! assert_eq!(sim.run(&trace), Err(SimErr::UnknownInterrupt(99)));
//! assert_eq!(sim.log().len(), 1);
//! assert_eq!(sim.now(), 10);
//! ```
//!
//! [`TimingStrategy`]: timing::TimingStrategy
//! [`DispatchPolicy`]: recipe::DispatchPolicy
//! [`DurationSource`]: timing::DurationSource
pub mod clock;
pub mod log;
pub mod recipe;
pub mod stats;
pub mod timing;
pub mod vector;

use crate::ast::{Activity, IntVect};

use self::clock::SimClock;
use self::log::LogRecord;
use self::recipe::{DispatchPolicy, Timing, VectorInfo};
use self::stats::Usage;
use self::timing::{DurationSource, TimingStrategy};
use self::vector::VectorTable;

/// Errors that can occur during simulation.
#[derive(Debug, PartialEq, Eq, Clone, Copy, thiserror::Error)]
pub enum SimErr {
    /// An activity referenced an interrupt that has no entry in the vector table.
    #[error("interrupt {0} is not in the vector table")]
    UnknownInterrupt(IntVect),
    /// The simulated clock would pass the largest representable time.
    #[error("simulated time overflowed")]
    TimeOverflow,
}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::UnknownInterrupt(_) => Some("check the trace's interrupt numbers against the vector table".into()),
            SimErr::TimeOverflow        => Some("the durations in this trace are too large".into()),
        }
    }
}

/// Configuration flags for [`Simulator`].
///
/// These can be modified after the `Simulator` is created with [`Simulator::new`]
/// and their effects apply to the next run.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// How durations of variable steps are drawn.
    ///
    /// A fresh duration source is created from this strategy at the start of every [`Simulator::run`].
    ///
    /// By default, this flag is [`TimingStrategy::Unseeded`].
    pub timing: TimingStrategy,

    /// Which micro-step recipes activities expand into.
    ///
    /// By default, this flag is [`DispatchPolicy::Flat`].
    pub policy: DispatchPolicy,
}

#[allow(clippy::derivable_impls)]
impl Default for SimFlags {
    fn default() -> Self {
        Self {
            timing: Default::default(),
            policy: Default::default(),
        }
    }
}

/// Dispatches activities and keeps the execution log.
#[derive(Debug)]
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Calling [`Simulator::reset`] resets these values.

    /// The simulated clock.
    clock: SimClock,

    /// The execution log (in emission order).
    log: Vec<LogRecord>,

    /// The number of activities successfully dispatched since the last reset.
    pub activities_run: u64,

    // ------------------ CONFIG STATE ------------------
    // Calling [`Simulator::reset`] does not reset these values.

    /// The vector table used to resolve interrupts.
    vector_table: VectorTable,

    /// Configuration settings for the simulator.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,
}

impl Simulator {
    /// Creates a new simulator with the built-in vector table.
    pub fn new(flags: SimFlags) -> Self {
        Self::with_vector_table(flags, VectorTable::default())
    }

    /// Creates a new simulator with the given vector table.
    pub fn with_vector_table(flags: SimFlags, vector_table: VectorTable) -> Self {
        Self {
            clock: SimClock::new(),
            log: vec![],
            activities_run: 0,
            vector_table,
            flags,
        }
    }

    /// Resets the simulator.
    ///
    /// This clears the log and sets the clock back to 0,
    /// while preserving the vector table and flags.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.log.clear();
        self.activities_run = 0;
    }

    /// The current simulated time (in ms).
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// The execution log so far.
    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    /// Takes the execution log, leaving an empty log behind.
    ///
    /// The clock is not reset.
    pub fn take_log(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.log)
    }

    /// The vector table used to resolve interrupts.
    pub fn vector_table(&self) -> &VectorTable {
        &self.vector_table
    }

    /// Summarizes where the time in the current log went.
    pub fn usage(&self) -> Usage {
        Usage::from_records(&self.log)
    }

    /// Expands one activity into its micro-steps, appending them to the log and advancing the clock.
    ///
    /// Durations of variable steps are drawn from `src`.
    /// On success, this returns the records that were appended.
    ///
    /// # Errors
    ///
    /// If the activity references an interrupt not in the vector table
    /// (or its durations overflow the clock), this returns an error.
    /// In that case, no records are appended and the clock does not move.
    pub fn dispatch<S: DurationSource + ?Sized>(&mut self, activity: &Activity, src: &mut S) -> Result<&[LogRecord], SimErr> {
        // Nothing is drawn or logged for an unresolvable interrupt.
        let info = match activity.vect() {
            Some(vect) => Some(VectorInfo {
                vect,
                offset: self.vector_table.offset(vect),
                isr: self.vector_table.resolve(vect)?,
            }),
            None => None,
        };

        let recipe = self.flags.policy.recipe(activity.kind());
        let mut budget = None;
        let mut clock = self.clock;
        let mut records = Vec::with_capacity(recipe.steps.len());

        for step in recipe.steps {
            let duration = match step.timing {
                Timing::Fixed(d) => d,
                Timing::Uniform { lo, hi } => src.draw(lo, hi),
                Timing::Requested => activity.duration(),
                Timing::IsrShare(pct) => {
                    let total = *budget.get_or_insert_with(|| {
                        recipe.isr_budget.map_or(0, |(lo, hi)| src.draw(lo, hi))
                    });
                    total.saturating_mul(u64::from(pct)) / 100
                },
            };

            let timestamp = clock.advance(duration)?;
            let record = LogRecord::new(timestamp, duration, step.op, step.op.describe(info.as_ref()));
            tracing::trace!(%record, "step");
            records.push(record);
        }

        // Commit.
        self.clock = clock;
        let start = self.log.len();
        self.log.append(&mut records);
        self.activities_run += 1;
        tracing::debug!(%activity, steps = recipe.steps.len(), now = self.clock.now(), "dispatched activity");

        Ok(&self.log[start..])
    }

    /// Runs every activity in order, drawing variable durations from `src`.
    ///
    /// This continues from the current clock and log (see [`Simulator::reset`]).
    /// On success, this returns the full log.
    ///
    /// # Errors
    ///
    /// The run stops at the first activity that fails to dispatch.
    /// Records of the activities before it are kept in the log.
    pub fn run_with<S: DurationSource + ?Sized>(&mut self, activities: &[Activity], src: &mut S) -> Result<&[LogRecord], SimErr> {
        let span = tracing::debug_span!("run", activities = activities.len(), policy = %self.flags.policy);
        let _guard = span.enter();

        for (i, activity) in activities.iter().enumerate() {
            if let Err(e) = self.dispatch(activity, src) {
                tracing::warn!(index = i, %activity, error = %e, "run aborted");
                return Err(e);
            }
        }

        Ok(&self.log)
    }

    /// Runs every activity in order, drawing variable durations from the source
    /// created by [`SimFlags::timing`].
    ///
    /// See [`Simulator::run_with`] for details.
    pub fn run(&mut self, activities: &[Activity]) -> Result<&[LogRecord], SimErr> {
        let mut src = self.flags.timing.generator();
        self.run_with(activities, &mut src)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use crate::ast::Activity;
    use crate::parse::parse_trace;

    use super::log::LogRecord;
    use super::recipe::{DispatchPolicy, MicroOp};
    use super::timing::TimingStrategy;
    use super::vector::VectorTable;
    use super::{SimErr, SimFlags, Simulator};

    fn seeded(seed: u64, policy: DispatchPolicy) -> Simulator {
        Simulator::new(SimFlags { timing: TimingStrategy::Seeded { seed }, policy })
    }
    fn assert_chained(log: &[LogRecord]) {
        for pair in log.windows(2) {
            assert_eq!(pair[1].timestamp, pair[0].timestamp + pair[0].duration, "records not chained: {pair:?}");
        }
    }
    fn lines(log: &[LogRecord]) -> Vec<String> {
        log.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_cpu_only() {
        let trace = parse_trace("CPU, 10\nCPU, 0\nCPU, 35").unwrap();
        let mut sim = seeded(0, Default::default());
        let log = sim.run(&trace).unwrap();

        assert_eq!(lines(log), [
            "0, 10, CPU execution",
            "10, 0, CPU execution",
            "10, 35, CPU execution",
        ]);
        assert_eq!(sim.now(), 45);
    }

    #[test]
    fn test_syscall_scripted() {
        let mut sim = Simulator::with_vector_table(Default::default(), VectorTable::new([(1, 0x01A3)]).unwrap());
        let trace = [Activity::CpuBurst { duration: 10 }, Activity::SystemCall { vect: 1, duration: 5 }];
        let mut src = VecDeque::<u64>::from([2, 250, 60, 70]);
        let log = sim.run_with(&trace, &mut src).unwrap();

        assert_eq!(lines(log), [
            "0, 10, CPU execution",
            "10, 1, switch to kernel mode",
            "11, 2, context saved",
            "13, 1, find vector 1 in memory position 0x0000",
            "14, 1, load address 0x01A3 into the PC",
            "15, 250, SYSCALL: run the ISR",
            "265, 60, transfer data",
            "325, 70, check for errors",
            "395, 1, IRET",
        ]);
        assert_eq!(sim.now(), 396);
        assert!(src.is_empty());
    }

    #[test]
    fn test_end_io_scripted() {
        let mut sim = Simulator::new(Default::default());
        let trace = [Activity::IoCompletion { vect: 20, duration: 300 }];
        let log = sim.run_with(&trace, &mut VecDeque::<u64>::from([3])).unwrap();

        assert_eq!(lines(log), [
            "0, 1, check priority of interrupt",
            "1, 1, check if masked",
            "2, 1, switch to kernel mode",
            "3, 3, context saved",
            "6, 1, find vector 20 in memory position 0x0026",
            "7, 1, load address 0x1B21 into the PC",
            "8, 300, END_IO 20: run the ISR",
            "308, 1, IRET",
        ]);
    }

    #[test]
    fn test_end_io_extra_leading_records() {
        let mut sc = Simulator::new(SimFlags { timing: TimingStrategy::Known { value: 0 }, ..Default::default() });
        let mut io = Simulator::new(SimFlags { timing: TimingStrategy::Known { value: 0 }, ..Default::default() });
        let sc_log = sc.run(&[Activity::SystemCall { vect: 4, duration: 10 }]).unwrap();
        let io_log = io.run(&[Activity::IoCompletion { vect: 4, duration: 10 }]).unwrap();

        assert_eq!(io_log[0].op, MicroOp::CheckPriority);
        assert_eq!(io_log[1].op, MicroOp::CheckMasked);
        assert!(!sc_log.iter().any(|r| matches!(r.op, MicroOp::CheckPriority | MicroOp::CheckMasked)));
        assert_eq!(io_log[2].op, sc_log[0].op);
    }

    #[test]
    fn test_split_policy() {
        let mut sim = Simulator::new(SimFlags { timing: TimingStrategy::Known { value: 201 }, policy: DispatchPolicy::Split });
        let trace = [Activity::SystemCall { vect: 7, duration: 5 }, Activity::IoCompletion { vect: 12, duration: 40 }];
        let log = sim.run(&trace).unwrap();
        assert_chained(log);

        // Known { value: 201 } picks 3 for context switches and 201 for the ISR budget.
        let sc: Vec<_> = log.iter().take(12).map(|r| (r.duration, r.description.as_str())).collect();
        assert_eq!(sc, [
            (0, "SYSCALL 7 initiated"),
            (1, "switch to kernel mode"),
            (3, "context saved"),
            (1, "find vector 7 in memory position 0x000C"),
            (1, "load address 0x0A19 into the PC"),
            (50, "save information to PCB"),
            (30, "call the scheduler"),
            (80, "execute the scheduler"),
            (40, "update interrupt controller status"),
            (1, "IRET"),
            (3, "context restored"),
            (1, "switch to user mode"),
        ]);
        assert_eq!(log[12].to_string(), format!("{}, 40, END_IO 12", log[11].end()));
        assert_eq!(log.len(), 24);
    }

    #[test]
    fn test_unknown_interrupt_is_atomic() {
        let mut sim = seeded(1, Default::default());
        let trace = parse_trace("CPU, 5\nEND_IO 26, 10\nCPU, 5").unwrap();

        assert_eq!(sim.run(&trace), Err(SimErr::UnknownInterrupt(26)));
        assert_eq!(lines(sim.log()), ["0, 5, CPU execution"]);
        assert_eq!(sim.now(), 5);
        assert_eq!(sim.activities_run, 1);
    }

    #[test]
    fn test_overflow_is_atomic() {
        let mut sim = seeded(1, Default::default());
        let trace = [Activity::CpuBurst { duration: u64::MAX - 2 }, Activity::IoCompletion { vect: 1, duration: 0 }];

        assert_eq!(sim.run(&trace), Err(SimErr::TimeOverflow));
        assert_eq!(sim.log().len(), 1);
        assert_eq!(sim.now(), u64::MAX - 2);
    }

    #[test]
    fn test_reset() {
        let mut sim = seeded(3, Default::default());
        let trace = parse_trace("CPU, 10\nSYSCALL 2, 1\nEND_IO 3, 30").unwrap();
        let first = sim.run(&trace).unwrap().to_vec();

        sim.reset();
        assert_eq!(sim.now(), 0);
        assert!(sim.log().is_empty());
        assert_eq!(sim.run(&trace).unwrap(), first);
    }

    #[test]
    fn test_run_continues() {
        let mut sim = seeded(3, Default::default());
        sim.run(&[Activity::CpuBurst { duration: 10 }]).unwrap();
        sim.run(&[Activity::CpuBurst { duration: 5 }]).unwrap();
        assert_eq!(lines(sim.log()), ["0, 10, CPU execution", "10, 5, CPU execution"]);

        let taken = sim.take_log();
        assert_eq!(taken.len(), 2);
        assert!(sim.log().is_empty());
        assert_eq!(sim.now(), 15);
    }

    #[test]
    fn test_usage() {
        let mut sim = Simulator::new(SimFlags { timing: TimingStrategy::Known { value: 1 }, ..Default::default() });
        sim.run(&parse_trace("CPU, 100\nEND_IO 1, 50").unwrap()).unwrap();

        let usage = sim.usage();
        assert_eq!(usage.cpu, 100);
        assert_eq!(usage.io, 50);
        assert_eq!(usage.overhead, 7);
        assert_eq!(usage.total(), sim.now());
    }

    fn arb_activity() -> impl Strategy<Value = Activity> {
        prop_oneof![
            (0..500u64).prop_map(|duration| Activity::CpuBurst { duration }),
            (1..=25u16, 0..500u64).prop_map(|(vect, duration)| Activity::SystemCall { vect, duration }),
            (1..=25u16, 0..500u64).prop_map(|(vect, duration)| Activity::IoCompletion { vect, duration }),
        ]
    }
    fn arb_policy() -> impl Strategy<Value = DispatchPolicy> {
        prop_oneof![Just(DispatchPolicy::Flat), Just(DispatchPolicy::Split)]
    }

    proptest! {
        #[test]
        fn prop_cpu_total(durations in prop::collection::vec(0..10_000u64, 0..50)) {
            let trace: Vec<_> = durations.iter().map(|&duration| Activity::CpuBurst { duration }).collect();
            let mut sim = Simulator::new(Default::default());
            sim.run(&trace).unwrap();
            prop_assert_eq!(sim.now(), durations.iter().sum::<u64>());
        }

        #[test]
        fn prop_records_chained(
            trace in prop::collection::vec(arb_activity(), 0..40),
            seed in any::<u64>(),
            policy in arb_policy()
        ) {
            let mut sim = seeded(seed, policy);
            let log = sim.run(&trace).unwrap();

            if let Some(first) = log.first() {
                prop_assert_eq!(first.timestamp, 0);
            }
            for pair in log.windows(2) {
                prop_assert_eq!(pair[1].timestamp, pair[0].timestamp + pair[0].duration);
            }
            let end = log.last().map_or(0, LogRecord::end);
            prop_assert_eq!(sim.now(), end);
        }

        #[test]
        fn prop_draws_bounded(trace in prop::collection::vec(arb_activity(), 0..40), seed in any::<u64>()) {
            let mut sim = seeded(seed, DispatchPolicy::Flat);
            for r in sim.run(&trace).unwrap() {
                let bounds = match r.op {
                    MicroOp::ContextSave => 1..=3,
                    MicroOp::SyscallIsr => 100..=400,
                    MicroOp::TransferData | MicroOp::CheckErrors => 50..=149,
                    _ => continue,
                };
                prop_assert!(bounds.contains(&r.duration), "{} out of bounds", r);
            }
        }

        #[test]
        fn prop_split_bounded(trace in prop::collection::vec(arb_activity(), 0..40), seed in any::<u64>()) {
            let mut sim = seeded(seed, DispatchPolicy::Split);
            let log = sim.run(&trace).unwrap();
            for w in log.windows(4) {
                if w[0].op == MicroOp::SavePcb {
                    let isr: u64 = w.iter().map(|r| r.duration).sum();
                    prop_assert!((96..=400).contains(&isr), "ISR total {} out of bounds", isr);
                }
            }
            for r in log.iter().filter(|r| matches!(r.op, MicroOp::ContextSave | MicroOp::ContextRestore)) {
                prop_assert!((1..=3).contains(&r.duration));
            }
        }

        #[test]
        fn prop_seeded_deterministic(
            trace in prop::collection::vec(arb_activity(), 0..40),
            seed in any::<u64>(),
            policy in arb_policy()
        ) {
            let a = seeded(seed, policy).run(&trace).unwrap().to_vec();
            let b = seeded(seed, policy).run(&trace).unwrap().to_vec();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_unknown_interrupt(vect in 26..=u16::MAX, syscall in any::<bool>()) {
            let activity = match syscall {
                true  => Activity::SystemCall { vect, duration: 1 },
                false => Activity::IoCompletion { vect, duration: 1 },
            };
            let mut sim = Simulator::new(Default::default());
            prop_assert_eq!(sim.run(&[activity]), Err(SimErr::UnknownInterrupt(vect)));
            prop_assert_eq!(sim.now(), 0);
        }
    }
}
