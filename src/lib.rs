//! A trace-driven simulator of CPU and interrupt-handling timing.
//!
//! This crate reads a trace of workload activities (CPU bursts, system calls, I/O completions)
//! and produces a millisecond-granular execution log of how a single processor
//! handles them: switching to kernel mode, saving context, looking up the interrupt vector,
//! running the interrupt service routine, and returning.
//!
//! # Usage
//!
//! To simulate a trace, it must first be parsed into activities:
//! ```
//! use irqsim::parse::parse_trace;
//!
//! let trace = "
//!     CPU, 10
//!     SYSCALL 1, 5
//!     END_IO 20, 300
//! ";
//! let activities = parse_trace(trace).unwrap();
//! assert_eq!(activities.len(), 3);
//! ```
//!
//! Once parsed, the activities can be run through the simulator:
//! ```
//! # use irqsim::parse::parse_trace;
//! # let activities = parse_trace("CPU, 10\nSYSCALL 1, 5\nEND_IO 20, 300").unwrap();
//! use irqsim::sim::Simulator;
//!
//! let mut simulator = Simulator::new(Default::default());
//! let log = simulator.run(&activities).unwrap(); // <-- Result can be handled accordingly
//!
//! for record in log {
//!     println!("{record}");
//! }
//! ```
//!
//! See the [`sim`] module for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod sim;
pub mod err;
