//! Round-trip checking: parse, serialize, compare.
//!
//! The checker is the correctness oracle of the crate. A document is only
//! accepted when serializing its entities reproduces it byte for byte.

use crate::ast::Entity;
use crate::error::{Error, Mismatch, ParseErrors, Result};
use crate::parser::Parser;
use crate::serializer::{RenderMode, Serializer};

/// A successful round-trip.
#[derive(Debug)]
pub struct RoundTripReport<'a> {
    /// The parsed entities.
    pub entities: Vec<Entity<'a>>,
    /// The serialized text, equal to the input.
    pub reconstructed: String,
    /// Recoverable problems met while parsing.
    pub errors: ParseErrors,
}

/// Configured parse-then-serialize pipeline.
#[derive(Debug, Clone, Default)]
pub struct RoundTrip {
    parser: Parser,
    serializer: Serializer,
}

impl RoundTrip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `separator` both to split the input and to join the output.
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.parser = self.parser.with_separator(separator);
        self.serializer = self.serializer.with_separator(separator);
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.serializer = self.serializer.with_mode(mode);
        self
    }

    #[inline]
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    #[inline]
    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Parse and serialize `text` without comparing.
    pub fn reconstruct<'a>(&self, text: &'a str) -> Result<(Vec<Entity<'a>>, String, ParseErrors)> {
        let result = self.parser.parse_str(text)?;
        let reconstructed = self.serializer.serialize(&result.entities);
        Ok((result.entities, reconstructed, result.errors))
    }

    /// Parse and serialize `text`, failing unless the output equals the input.
    pub fn check<'a>(&self, text: &'a str) -> Result<RoundTripReport<'a>> {
        let (entities, reconstructed, errors) = self.reconstruct(text)?;
        if reconstructed != text {
            let mismatch = Mismatch::new(text, reconstructed);
            log::debug!(
                "round-trip mismatch at line {}, column {}",
                mismatch.line,
                mismatch.column
            );
            return Err(Error::RoundTripMismatch(Box::new(mismatch)));
        }
        Ok(RoundTripReport {
            entities,
            reconstructed,
            errors,
        })
    }

    /// Check that re-parsing the reconstructed text yields the same entities.
    ///
    /// Guards against a serialized form that matches textually but parses
    /// differently.
    pub fn is_stable(&self, text: &str) -> Result<bool> {
        let (entities, reconstructed, _) = self.reconstruct(text)?;
        let reparsed = self.parser.parse_str(&reconstructed)?;
        Ok(reparsed.entities == entities)
    }
}

/// Parse `text` split on `separator` and verify it serializes back exactly.
///
/// ```rust
/// use roundmark_core::check_round_trip;
///
/// let entities = check_round_trip("# Title\n\nBody with $x$.\n", "\n").unwrap();
/// assert_eq!(entities.len(), 4);
/// ```
pub fn check_round_trip<'a>(text: &'a str, separator: &str) -> Result<Vec<Entity<'a>>> {
    RoundTrip::new()
        .with_separator(separator)
        .check(text)
        .map(|report| report.entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_carries_reconstruction() {
        let err = check_round_trip("#Title", "\n").unwrap_err();
        match err {
            Error::RoundTripMismatch(m) => {
                assert_eq!(m.original, "#Title");
                assert_eq!(m.reconstructed, "# Title");
                assert_eq!((m.line, m.column), (1, 2));
            }
            other => panic!("Expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn empty_document_has_no_entities() {
        assert!(check_round_trip("", "\n").unwrap().is_empty());
    }

    #[test]
    fn empty_separator_is_an_error() {
        assert_eq!(check_round_trip("a", "").unwrap_err(), Error::EmptySeparator);
    }

    #[test]
    fn spans_mode_round_trips() {
        let rt = RoundTrip::new().with_mode(RenderMode::Spans);
        let report = rt.check("- a [b](c) $$d$$\n1. $e$ f").unwrap();
        assert_eq!(report.entities.len(), 2);
    }

    #[test]
    fn stability_holds_for_mismatching_input() {
        // "#Title" reconstructs as "# Title", which parses to the same title
        assert!(RoundTrip::new().is_stable("#Title").unwrap());
    }
}
