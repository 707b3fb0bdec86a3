//! Tokenizing trace files.
//!
//! This module holds the tokens that characterize a trace ([`Token`]).
//! This module is used by the parser to convert trace text into a list of activities.
//!
//! A trace is line-oriented. Each line is either empty, a comment,
//! or an activity such as `SYSCALL 7, 120`.

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

/// A unit of information in a trace.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t]+", error = LexErr)]
pub enum Token {
    // Like the identifier regex, this spans over tokens that are technically invalid
    // (e.g., 23trst) so that the validator can report them as one unit.

    /// An unsigned numeric value (e.g., `9`, `120`, `0x1A3`)
    #[regex(r"\d\w*", lex_unsigned)]
    Unsigned(u64),

    /// An identifier (e.g., `CPU`, `SYSCALL`, `END_IO`).
    ///
    /// Whether this is a recognized activity keyword is decided by the parser.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().to_string())]
    Ident(String),

    /// A comma, which separates the activity from its duration
    #[token(",")]
    Comma,

    /// A comment, which starts with `#` or `;` and spans the remaining part of the line.
    #[regex(r"[#;].*")]
    Comment,

    /// A new line
    #[regex(r"\r?\n")]
    NewLine
}

/// Any errors raised in attempting to tokenize a trace.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, thiserror::Error)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of a u64
    #[error("numeric token does not fit 64-bit unsigned integer")]
    DoesNotFitU64,
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits (i.e., not 0-9)
    #[error("invalid decimal literal")]
    InvalidNumeric,
    /// Hex literal (starting with 0x) has invalid hex digits
    #[error("invalid hex literal")]
    InvalidHex,
    /// Hex literal (starting with 0x) doesn't have digits after it.
    #[error("invalid hex literal")]
    InvalidHexEmpty,
    /// Int parsing failed but the reason why is unknown
    #[error("could not parse integer")]
    UnknownIntErr,
    /// A symbol was used which is not allowed in a trace
    #[default]
    #[error("unrecognized symbol")]
    InvalidSymbol
}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitU64   => Some(format!("the range for a 64-bit unsigned integer is [{}, {}]", u64::MIN, u64::MAX).into()),
            LexErr::InvalidNumeric  => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidHex      => Some("a hex literal starts with '0x' and consists of 0-9, A-F".into()),
            LexErr::InvalidHexEmpty => Some("there should be hex digits (0-9, A-F) here".into()),
            LexErr::UnknownIntErr   => None,
            LexErr::InvalidSymbol   => Some("this char does not occur in any token of a trace".into()),
        }
    }
}

/// Helper that converts an int error kind to its corresponding LexErr.
fn convert_int_error(e: &IntErrorKind, invalid_digits_err: LexErr, empty_err: LexErr) -> LexErr {
    match e {
        IntErrorKind::Empty        => empty_err,
        IntErrorKind::InvalidDigit => invalid_digits_err,
        IntErrorKind::PosOverflow  => LexErr::DoesNotFitU64,
        IntErrorKind::Zero         => unreachable!("IntErrorKind::Zero should not be emitted in parsing u64"),
        _ => LexErr::UnknownIntErr,
    }
}
fn lex_unsigned(lx: &Lexer<'_, Token>) -> Result<u64, LexErr> {
    let string = lx.slice();

    match string.strip_prefix("0x").or_else(|| string.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidHex, LexErr::InvalidHexEmpty)),
        None => string.parse::<u64>()
            .map_err(|e| convert_int_error(e.kind(), LexErr::InvalidNumeric, LexErr::InvalidNumeric)),
    }
}
