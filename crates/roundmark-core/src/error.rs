//! Error types.
//!
//! [`Error`] is the only thing the core ever returns as `Err`: a round-trip
//! mismatch, or an unusable separator. Malformed constructs in the input are
//! not errors; they degrade to literal text and are reported as recoverable
//! [`ParseError`]s alongside the parse result.

use std::fmt;

use thiserror::Error;

use crate::inline::MalformedKind;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Serializing the parsed entities did not reproduce the input.
    #[error(
        "round-trip mismatch at line {}, column {}",
        .0.line,
        .0.column
    )]
    RoundTripMismatch(Box<Mismatch>),

    /// Lines cannot be split on an empty separator.
    #[error("line separator must not be empty")]
    EmptySeparator,
}

/// The two texts of a failed round-trip and where they first diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// The input text.
    pub original: String,
    /// The text reconstructed from the parsed entities.
    pub reconstructed: String,
    /// Byte offset of the first difference, on a char boundary of both texts.
    pub offset: usize,
    /// 1-based line of the first difference in `original`.
    pub line: usize,
    /// 1-based column (in chars) of the first difference in `original`.
    pub column: usize,
}

impl Mismatch {
    /// Compare two texts and locate their first difference.
    pub fn new(original: impl Into<String>, reconstructed: impl Into<String>) -> Self {
        let original = original.into();
        let reconstructed = reconstructed.into();

        let mut offset = original
            .bytes()
            .zip(reconstructed.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        while !(original.is_char_boundary(offset) && reconstructed.is_char_boundary(offset)) {
            offset -= 1;
        }

        let before = &original[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;

        Self {
            original,
            reconstructed,
            offset,
            line,
            column,
        }
    }
}

/// Kinds of recoverable problems found while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Code fence or `$$` block still open at end of input.
    UnclosedDelimiter,
    /// Inline `$` or `$$` without its closing marker.
    UnterminatedMath,
    /// Inline link brackets that never close, or a missing `)`.
    UnterminatedLink,
}

impl From<MalformedKind> for ParseErrorKind {
    fn from(kind: MalformedKind) -> Self {
        match kind {
            MalformedKind::UnterminatedDisplayMath | MalformedKind::UnterminatedInlineMath => {
                ParseErrorKind::UnterminatedMath
            }
            MalformedKind::UnterminatedLink => ParseErrorKind::UnterminatedLink,
        }
    }
}

/// A problem the parser recovered from.
///
/// Parsing always runs to the end of the input, so every problem is
/// recoverable: the construct was kept as text or closed implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// 1-based source line where the problem starts
    pub line: Option<usize>,
    /// Error categorization
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create an error for a block delimiter left open at end of input.
    pub fn unclosed_delimiter(delimiter: &str, line: Option<usize>) -> Self {
        Self {
            message: format!("unclosed {}", delimiter),
            line,
            kind: ParseErrorKind::UnclosedDelimiter,
        }
    }

    /// Create an error for an inline construct that fell back to literal text.
    pub fn malformed(kind: MalformedKind, line: Option<usize>, column: usize) -> Self {
        let what = match kind {
            MalformedKind::UnterminatedDisplayMath => "unterminated `$$`",
            MalformedKind::UnterminatedInlineMath => "unterminated `$`",
            MalformedKind::UnterminatedLink => "unterminated link",
        };
        Self {
            message: format!("{} at column {}, kept as text", what, column),
            line,
            kind: kind.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line) = self.line {
            write!(f, " on line {}", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// A collection of parse errors encountered during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create an empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if any errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }
}
