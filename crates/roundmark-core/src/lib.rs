//! # Roundmark Core
//!
//! A lossless parser and serializer for a small Markdown dialect.
//!
//! A document is split into lines, scanned into a flat sequence of typed
//! [`Entity`] values (headings, fenced code, `$$` math, lists, paragraphs
//! with inline math and links, whole-line links and images, blank lines),
//! and can be serialized back to exactly the original text.
//!
//! ## Quick Start
//!
//! ```rust
//! use roundmark_core::{parse, serialize};
//! use roundmark_core::lexer::split_lines;
//!
//! let input = "# Hello\n\n- item with $x$\n";
//! let lines = split_lines(input, "\n").unwrap();
//! let entities = parse(&lines, "\n");
//!
//! assert_eq!(entities.len(), 4);
//! assert_eq!(serialize(&entities), input);
//! ```
//!
//! ## Round-Trip Checking
//!
//! [`check_round_trip`] runs both stages and fails with
//! [`Error::RoundTripMismatch`] when the output differs from the input:
//!
//! ```rust
//! use roundmark_core::{check_round_trip, Error};
//!
//! assert!(check_round_trip("```rust\nfn main() {}\n```", "\n").is_ok());
//!
//! // Headings are always written with one space after the markers.
//! let err = check_round_trip("##Tight", "\n").unwrap_err();
//! assert!(matches!(err, Error::RoundTripMismatch(_)));
//! ```
//!
//! ## Error Recovery
//!
//! Unterminated constructs never fail a parse. Inline `$`, `$$` and `[`
//! without their closing markers stay literal text, and blocks still open
//! at end of input are closed implicitly. Each case is reported through
//! [`Parser::parse_with_recovery`].

pub mod ast;
pub mod error;
pub mod inline;
pub mod lexer;
pub mod parser;
pub mod roundtrip;
pub mod serializer;

pub use ast::{Entity, EntityKind, Fence, ListItem, ListMarker, Paragraph};
pub use error::{Error, Mismatch, ParseError, ParseErrorKind, ParseErrors, Result};
pub use parser::{ParseResult, Parser};
pub use roundtrip::{check_round_trip, RoundTrip, RoundTripReport};
pub use serializer::{serialize, RenderMode, Serializer};

/// Parse a sequence of lines that were split on `separator`.
#[inline]
pub fn parse<'a>(lines: &[&'a str], separator: &str) -> Vec<Entity<'a>> {
    Parser::new().with_separator(separator).parse(lines)
}
