//! Parsing traces into activities.
//!
//! This module is used to convert the text of a trace file into a list of [`Activity`] records,
//! which can then be fed into the simulator.
//!
//! The grammar of a trace line is:
//! ```text
//! line     := activity? comment?
//! activity := KIND vect? "," duration
//! comment  := ("#" | ";") ...
//! ```
//! where `KIND` is one of `CPU`, `SYSCALL`, `END_IO` (case-insensitive).
//!
//! # Usage
//!
//! ```
//! use irqsim::parse::parse_trace;
//! use irqsim::ast::Activity;
//!
//! let trace = "
//!     CPU, 10
//!     SYSCALL 7, 120 # read
//!     END_IO 20, 300
//! ";
//! let activities = parse_trace(trace).unwrap();
//! assert_eq!(activities, [
//!     Activity::CpuBurst { duration: 10 },
//!     Activity::SystemCall { vect: 7, duration: 120 },
//!     Activity::IoCompletion { vect: 20, duration: 300 },
//! ]);
//! ```
pub mod lex;

use std::ops::Range;

use logos::Logos;

use crate::ast::{Activity, ActivityErr, ActivityKind, IntVect};
use crate::err::ErrSpan;
use lex::{LexErr, Token};

/// Kinds of errors that can occur while parsing a trace.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum ParseErrKind {
    /// The line could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexErr),
    /// The line was tokenized, but did not form a recognized activity.
    #[error("malformed activity: {0}")]
    MalformedActivity(#[from] ActivityErr),
    /// The line did not start with an activity keyword.
    #[error("expected activity kind")]
    ExpectedKind,
    /// The activity (and interrupt number) was not followed by a comma.
    #[error("expected comma")]
    ExpectedComma,
    /// The comma was not followed by a duration.
    #[error("expected duration")]
    ExpectedDuration,
    /// The interrupt number does not fit in an interrupt vector.
    #[error("interrupt number is too large")]
    VectTooLarge,
    /// Tokens were found after the duration.
    #[error("unexpected tokens after duration")]
    TrailingTokens,
}

/// Error from parsing a trace.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseErr {
    /// The kind of error.
    pub kind: ParseErrKind,
    /// The (1-indexed) line the error occurred on.
    pub line: usize,
    /// The span in the source associated with this error.
    pub span: ErrSpan
}
impl ParseErr {
    /// Creates a new [`ParseErr`].
    pub fn new<E: Into<ErrSpan>>(kind: ParseErrKind, line: usize, span: E) -> Self {
        ParseErr { kind, line, span: span.into() }
    }
}
impl crate::err::Error for ParseErr {
    fn span(&self) -> Option<ErrSpan> {
        Some(self.span.clone())
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        use crate::err::Error;

        match &self.kind {
            ParseErrKind::Lex(e)               => e.help(),
            ParseErrKind::MalformedActivity(e) => e.help(),
            ParseErrKind::ExpectedKind         => Some("each line should start with CPU, SYSCALL, or END_IO".into()),
            ParseErrKind::ExpectedComma        => Some("separate the duration from the activity with a comma".into()),
            ParseErrKind::ExpectedDuration     => Some("add a duration (in ms) after the comma".into()),
            ParseErrKind::VectTooLarge         => Some(format!("interrupt numbers must be at most {}", IntVect::MAX).into()),
            ParseErrKind::TrailingTokens       => Some("try removing these or starting a comment with #".into()),
        }
    }
}

type Spanned = (Token, Range<usize>);

/// Parses a trace into its activities, in order.
///
/// Blank lines and comments are skipped.
/// Any line that does not form a recognized activity fails the whole parse.
pub fn parse_trace(src: &str) -> Result<Vec<Activity>, ParseErr> {
    let mut activities = vec![];
    let mut line: Vec<Spanned> = vec![];
    let mut line_no = 1;

    for (m_token, span) in Token::lexer(src).spanned() {
        let token = m_token.map_err(|e| ParseErr::new(e.into(), line_no, span.clone()))?;
        match token {
            Token::Comment => {},
            Token::NewLine => {
                activities.extend(parse_line(&line, line_no, span.start)?);
                line.clear();
                line_no += 1;
            },
            t => line.push((t, span)),
        }
    }
    activities.extend(parse_line(&line, line_no, src.len())?);

    Ok(activities)
}

/// Parses the tokens of one line, returning `None` for an empty line.
///
/// `eol` is the source index of the end of the line.
fn parse_line(tokens: &[Spanned], line: usize, eol: usize) -> Result<Option<Activity>, ParseErr> {
    let err = |kind: ParseErrKind, span: Range<usize>| ParseErr::new(kind, line, span);

    let mut it = tokens.iter();
    let Some((first, first_span)) = it.next() else { return Ok(None) };
    let Token::Ident(name) = first else {
        return Err(err(ParseErrKind::ExpectedKind, first_span.clone()));
    };
    let kind: ActivityKind = name.parse()
        .map_err(|e: ActivityErr| err(e.into(), first_span.clone()))?;

    let mut next = it.next();
    let mut vect = None;
    if let Some((Token::Unsigned(n), span)) = next {
        let v = IntVect::try_from(*n).map_err(|_| err(ParseErrKind::VectTooLarge, span.clone()))?;
        vect = Some(v);
        next = it.next();
    }

    match next {
        Some((Token::Comma, _)) => {},
        Some((_, span)) => return Err(err(ParseErrKind::ExpectedComma, span.clone())),
        None => return Err(err(ParseErrKind::ExpectedComma, eol..eol)),
    }
    let (duration, last_end) = match it.next() {
        Some((Token::Unsigned(d), span)) => (*d, span.end),
        Some((_, span)) => return Err(err(ParseErrKind::ExpectedDuration, span.clone())),
        None => return Err(err(ParseErrKind::ExpectedDuration, eol..eol)),
    };
    if let Some((_, span)) = it.next() {
        let end = tokens.last().map_or(span.end, |(_, s)| s.end);
        return Err(err(ParseErrKind::TrailingTokens, span.start..end));
    }

    Activity::new(kind, vect, duration)
        .map(Some)
        .map_err(|e| err(e.into(), first_span.start..last_end))
}

impl std::str::FromStr for Activity {
    type Err = ParseErr;

    /// Parses a single trace line into an activity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let activities = parse_trace(s)?;
        match &*activities {
            [a] => Ok(*a),
            _ => Err(ParseErr::new(ParseErrKind::ExpectedKind, 1, 0..s.len())),
        }
    }
}
