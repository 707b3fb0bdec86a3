//! Error interface for this crate.
//!
//! Every error type produced by this crate implements [`Error`],
//! which adds optional diagnostic information (a source span and a help message)
//! on top of [`std::error::Error`].
//!
//! All of the error types are also re-exported here:
//! - [`LexErr`]: errors from tokenizing a trace
//! - [`ParseErr`]: errors from parsing a trace into activities
//! - [`TableErr`]: errors from constructing a vector table
//! - [`SimErr`]: errors from running the simulation

use std::borrow::Cow;
use std::ops::Range;

pub use crate::parse::lex::LexErr;
pub use crate::parse::{ParseErr, ParseErrKind};
pub use crate::sim::vector::TableErr;
pub use crate::sim::SimErr;

/// A span of characters in the source trace.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ErrSpan(pub Range<usize>);
impl ErrSpan {
    /// The first character of the span.
    pub fn start(&self) -> usize {
        self.0.start
    }
    /// One past the last character of the span.
    pub fn end(&self) -> usize {
        self.0.end
    }
}
impl From<Range<usize>> for ErrSpan {
    fn from(value: Range<usize>) -> Self {
        ErrSpan(value)
    }
}
impl std::fmt::Display for ErrSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.0.start, self.0.end)
    }
}

/// Unified error interface for all errors in this crate.
pub trait Error: std::error::Error {
    /// The range of source characters this error occurred at, if one exists.
    fn span(&self) -> Option<ErrSpan> {
        None
    }

    /// A help message to show alongside the error, if one exists.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}
