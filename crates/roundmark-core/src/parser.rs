//! Line-oriented block scanner.
//!
//! Classifies each line into a block entity, running a small state machine
//! for the two multi-line constructs (fenced code, `$$` math). Entities
//! borrow from the input lines wherever their payload is a verbatim slice.

use std::borrow::Cow;

use crate::ast::{
    CodeBlock, Entity, Fence, Link, ListItem, ListMarker, Math, Paragraph, Text, Title,
};
use crate::error::{ParseError, ParseErrors, Result};
use crate::inline::{InlineScanner, Malformed};
use crate::lexer::{is_blank, leading_hashes, leading_spaces, split_lines};

/// Result type for parsing that includes recovered errors.
#[derive(Debug)]
pub struct ParseResult<'a> {
    /// The parsed entities, in document order.
    pub entities: Vec<Entity<'a>>,
    /// Malformed constructs that were kept as text or closed implicitly.
    pub errors: ParseErrors,
}

impl<'a> ParseResult<'a> {
    /// Check if parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Multi-line construct currently open, owning its buffered lines.
enum ScanState<'a> {
    Normal,
    Code {
        fence: Fence,
        language: &'a str,
        lines: Vec<&'a str>,
        opened_at: usize,
    },
    Math {
        lines: Vec<&'a str>,
        opened_at: usize,
    },
}

/// Block scanner with a configurable line separator.
#[derive(Debug, Clone)]
pub struct Parser {
    /// Separator the caller split the document on.
    separator: String,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser for `\n`-separated documents.
    #[inline]
    pub fn new() -> Self {
        Self {
            separator: String::from("\n"),
        }
    }

    /// Use a different line separator.
    ///
    /// A line equal to the separator is a re-join artifact left by callers
    /// that interleave separators with lines; the scanner skips it.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[inline]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Parse a sequence of lines into entities.
    #[inline]
    pub fn parse<'a>(&self, lines: &[&'a str]) -> Vec<Entity<'a>> {
        self.parse_with_recovery(lines).entities
    }

    /// Split `text` on the separator and parse it.
    ///
    /// The empty document has no entities.
    pub fn parse_str<'a>(&self, text: &'a str) -> Result<ParseResult<'a>> {
        if text.is_empty() {
            return Ok(ParseResult {
                entities: Vec::new(),
                errors: ParseErrors::new(),
            });
        }
        let lines = split_lines(text, &self.separator)?;
        Ok(self.parse_with_recovery(&lines))
    }

    /// Parse, returning entities together with the recovered errors.
    pub fn parse_with_recovery<'a>(&self, lines: &[&'a str]) -> ParseResult<'a> {
        let mut entities = Vec::with_capacity(lines.len());
        let mut errors = ParseErrors::new();
        let mut state = ScanState::Normal;

        for (index, &line) in lines.iter().enumerate() {
            if !self.separator.is_empty() && line == self.separator {
                continue;
            }
            let number = index + 1;

            state = match state {
                ScanState::Math {
                    mut lines,
                    opened_at,
                } => {
                    if line.starts_with("$$") {
                        log::trace!(
                            "line {}: closing $$ block opened on line {}",
                            number,
                            opened_at
                        );
                        entities.push(display_math(lines.join(&self.separator)));
                        ScanState::Normal
                    } else {
                        lines.push(line);
                        ScanState::Math { lines, opened_at }
                    }
                }
                ScanState::Code {
                    fence,
                    language,
                    mut lines,
                    opened_at,
                } => {
                    // A fence of the other style is ordinary content.
                    if line.starts_with(fence.as_str()) {
                        log::trace!(
                            "line {}: closing {} block opened on line {}",
                            number,
                            fence,
                            opened_at
                        );
                        entities.push(code_block(lines.join(&self.separator), language, fence));
                        ScanState::Normal
                    } else {
                        lines.push(line);
                        ScanState::Code {
                            fence,
                            language,
                            lines,
                            opened_at,
                        }
                    }
                }
                ScanState::Normal => self.scan_line(line, number, &mut entities, &mut errors),
            };
        }

        match state {
            ScanState::Normal => {}
            ScanState::Math { lines, opened_at } => {
                log::debug!("$$ block opened on line {} is never closed", opened_at);
                errors.push(ParseError::unclosed_delimiter("$$", Some(opened_at)));
                entities.push(display_math(lines.join(&self.separator)));
            }
            ScanState::Code {
                fence,
                language,
                lines,
                opened_at,
            } => {
                log::debug!("{} block opened on line {} is never closed", fence, opened_at);
                errors.push(ParseError::unclosed_delimiter(fence.as_str(), Some(opened_at)));
                entities.push(code_block(lines.join(&self.separator), language, fence));
            }
        }

        ParseResult { entities, errors }
    }

    /// Classify a line outside any multi-line construct.
    fn scan_line<'a>(
        &self,
        line: &'a str,
        number: usize,
        entities: &mut Vec<Entity<'a>>,
        errors: &mut ParseErrors,
    ) -> ScanState<'a> {
        if line.starts_with("$$") {
            log::trace!("line {}: opening $$ block", number);
            return ScanState::Math {
                lines: Vec::new(),
                opened_at: number,
            };
        }

        if line.starts_with('#') {
            let level = leading_hashes(line);
            entities.push(Entity::Title(Title {
                content: Cow::Borrowed(line[level..].trim()),
                level,
            }));
            return ScanState::Normal;
        }

        if let Some(fence) = Fence::detect(line) {
            log::trace!("line {}: opening {} block", number, fence);
            return ScanState::Code {
                fence,
                language: &line[fence.as_str().len()..],
                lines: Vec::new(),
                opened_at: number,
            };
        }

        let trimmed = line.trim();

        if let Some((content, url)) = whole_line_link(trimmed) {
            entities.push(Entity::Link(Link {
                content: Cow::Borrowed(content),
                url: Cow::Borrowed(url),
            }));
        } else if let Some((content, url)) = trimmed.strip_prefix('!').and_then(whole_line_link) {
            entities.push(Entity::Image(Link {
                content: Cow::Borrowed(content),
                url: Cow::Borrowed(url),
            }));
        } else if let Some((indent, marker, content)) = list_marker(line) {
            let (spans, malformed) = InlineScanner::new(content).scan();
            // `content` is a suffix of `line`
            let start = line.len() - content.len();
            record_malformed(line, start, &malformed, number, errors);
            let item = ListItem::from_spans(content, indent, marker, spans);
            entities.push(Entity::ListItem(item));
        } else if !is_blank(line) {
            let (spans, malformed) = InlineScanner::new(line).scan();
            record_malformed(line, 0, &malformed, number, errors);
            entities.push(Entity::Paragraph(Paragraph::from_spans(spans)));
        } else {
            entities.push(Entity::EmptyLine(Text {
                content: Cow::Borrowed(line),
            }));
        }

        ScanState::Normal
    }
}

/// Report inline constructs of `line` that fell back to text. Offsets are
/// relative to the scanned text, which starts at byte `start` of the line.
fn record_malformed(
    line: &str,
    start: usize,
    malformed: &[Malformed],
    number: usize,
    errors: &mut ParseErrors,
) {
    for m in malformed {
        let column = line[..start + m.offset].chars().count() + 1;
        errors.push(ParseError::malformed(m.kind, Some(number), column));
    }
}

#[inline]
fn display_math<'a>(content: String) -> Entity<'a> {
    Entity::DisplayMath(Math {
        content: Cow::Owned(content),
    })
}

#[inline]
fn code_block<'a>(content: String, language: &'a str, fence: Fence) -> Entity<'a> {
    Entity::CodeBlock(CodeBlock {
        content: Cow::Owned(content),
        language: Cow::Borrowed(language),
        fence,
    })
}

/// Match a line that is exactly one `[text](url)`.
///
/// The text may not contain `[`, the url may not contain `(` or `)`, and the
/// closing `)` must be the last character.
fn whole_line_link(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let (content, after) = (&rest[..close], &rest[close + 1..]);
    if content.contains('[') {
        return None;
    }
    let url = after.strip_prefix('(')?.strip_suffix(')')?;
    if url.contains(['(', ')']) {
        return None;
    }
    Some((content, url))
}

/// Match `<spaces><marker> <content>`, where the marker is `-`, `*`, `+` or
/// `<digits>.` and the content is non-empty.
///
/// Ordered indices must be written canonically (no leading zeros) and fit
/// in a `u64`, so that rendering the parsed index reproduces the line.
fn list_marker(line: &str) -> Option<(usize, ListMarker, &str)> {
    let indent = leading_spaces(line);
    let rest = &line[indent..];

    let (marker, after) = match *rest.as_bytes().first()? {
        b @ (b'-' | b'*' | b'+') => (ListMarker::Bullet(b as char), &rest[1..]),
        b'0'..=b'9' => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            let number = &rest[..digits];
            if digits > 1 && number.starts_with('0') {
                return None;
            }
            let after = rest[digits..].strip_prefix('.')?;
            (ListMarker::Ordered(number.parse().ok()?), after)
        }
        _ => return None,
    };

    let content = after.strip_prefix(' ')?;
    if content.is_empty() {
        return None;
    }
    Some((indent, marker, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_line_link_shapes() {
        assert_eq!(whole_line_link("[a](b)"), Some(("a", "b")));
        assert_eq!(whole_line_link("[](x)"), Some(("", "x")));
        assert_eq!(whole_line_link("[a](b) tail"), None);
        assert_eq!(whole_line_link("[a] (b)"), None);
        assert_eq!(whole_line_link("[a [b]](c)"), None);
        assert_eq!(whole_line_link("[a](b)(c)"), None);
        assert_eq!(whole_line_link("[a](b) [c](d)"), None);
    }

    #[test]
    fn list_marker_shapes() {
        assert_eq!(
            list_marker("- item"),
            Some((0, ListMarker::Bullet('-'), "item"))
        );
        assert_eq!(
            list_marker("    * deep"),
            Some((4, ListMarker::Bullet('*'), "deep"))
        );
        assert_eq!(
            list_marker("12. twelve"),
            Some((0, ListMarker::Ordered(12), "twelve"))
        );
        assert_eq!(
            list_marker("0. zero"),
            Some((0, ListMarker::Ordered(0), "zero"))
        );
        assert_eq!(list_marker("-item"), None);
        assert_eq!(list_marker("- "), None);
        assert_eq!(list_marker("-\titem"), None);
        assert_eq!(list_marker("1) item"), None);
        assert_eq!(list_marker("01. item"), None);
        assert_eq!(list_marker("99999999999999999999999. big"), None);
    }

    #[test]
    fn separator_lines_are_skipped() {
        let parser = Parser::new();
        let entities = parser.parse(&["a", "\n", "b"]);
        assert_eq!(entities.len(), 2);
        assert!(entities.iter().all(|e| matches!(e, Entity::Paragraph(_))));
    }
}
