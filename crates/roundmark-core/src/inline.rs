//! Inline span scanner.
//!
//! Splits a single line (or a list item's content) into text runs, inline
//! math, mid-line display math and inline links. Greedy, left-to-right,
//! no backtracking across emitted spans. Unterminated constructs degrade to
//! literal text so that every input scans to spans that re-concatenate to it.

use std::borrow::Cow;

use memchr::{memchr, memchr2, memchr2_iter, memmem};

use crate::ast::{Entity, Link, Math, Text};

/// Scan `text` into inline spans.
///
/// ```rust
/// use roundmark_core::inline::scan_inline;
/// use roundmark_core::Entity;
///
/// let spans = scan_inline("area is $\\pi r^2$");
/// assert_eq!(spans.len(), 2);
/// assert!(matches!(&spans[1], Entity::InlineMath(m) if m.content == "\\pi r^2"));
/// ```
#[inline]
pub fn scan_inline(text: &str) -> Vec<Entity<'_>> {
    InlineScanner::new(text).scan().0
}

/// Kind of construct that degraded to literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedKind {
    /// `$$` without a closing `$$`.
    UnterminatedDisplayMath,
    /// `$` without a closing `$`.
    UnterminatedInlineMath,
    /// `[` whose brackets never balance, or `[..](` without a closing `)`.
    UnterminatedLink,
}

/// A degraded construct and the byte offset where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Malformed {
    pub kind: MalformedKind,
    pub offset: usize,
}

enum Step {
    Continue,
    Stop,
}

/// Single-pass inline scanner over one line.
pub struct InlineScanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Start of the pending text run.
    text_start: usize,
    spans: Vec<Entity<'a>>,
    malformed: Vec<Malformed>,
    /// Every `[` of the line with its matching `]`, built on first use.
    brackets: Option<Vec<(usize, Option<usize>)>>,
    /// Earliest offset known to have no `)` at or after it.
    no_paren_from: Option<usize>,
}

impl<'a> InlineScanner<'a> {
    #[inline]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            text_start: 0,
            spans: Vec::with_capacity(4),
            malformed: Vec::new(),
            brackets: None,
            no_paren_from: None,
        }
    }

    /// Run the scan, returning the spans and any degraded constructs.
    pub fn scan(mut self) -> (Vec<Entity<'a>>, Vec<Malformed>) {
        while self.pos < self.bytes.len() {
            let Some(offset) = memchr2(b'$', b'[', &self.bytes[self.pos..]) else {
                break;
            };
            self.pos += offset;

            let step = match self.bytes[self.pos] {
                b'$' if self.bytes.get(self.pos + 1) == Some(&b'$') => self.scan_display_math(),
                b'$' => self.scan_inline_math(),
                _ => self.scan_link(),
            };

            if let Step::Stop = step {
                break;
            }
        }

        // Flush remaining text
        if self.text_start < self.bytes.len() {
            let run = &self.text[self.text_start..];
            self.spans.push(Entity::Text(Text {
                content: Cow::Borrowed(run),
            }));
        }

        (self.spans, self.malformed)
    }

    /// Push the pending text run (if any), then `span`, and resume at `resume`.
    #[inline]
    fn emit(&mut self, span: Entity<'a>, resume: usize) {
        if self.text_start < self.pos {
            let run = &self.text[self.text_start..self.pos];
            self.spans.push(Entity::Text(Text {
                content: Cow::Borrowed(run),
            }));
        }
        self.spans.push(span);
        self.pos = resume;
        self.text_start = resume;
    }

    /// Leave everything from here on as literal text.
    #[inline]
    fn degrade_rest(&mut self, kind: MalformedKind) -> Step {
        self.malformed.push(Malformed {
            kind,
            offset: self.pos,
        });
        self.pos = self.bytes.len();
        Step::Stop
    }

    fn scan_display_math(&mut self) -> Step {
        let inner_start = self.pos + 2;
        match memmem::find(&self.bytes[inner_start..], b"$$") {
            Some(len) => {
                let close = inner_start + len;
                let content = &self.text[inner_start..close];
                self.emit(
                    Entity::DisplayMath(Math {
                        content: Cow::Borrowed(content),
                    }),
                    close + 2,
                );
                Step::Continue
            }
            None => self.degrade_rest(MalformedKind::UnterminatedDisplayMath),
        }
    }

    fn scan_inline_math(&mut self) -> Step {
        let inner_start = self.pos + 1;
        match memchr(b'$', &self.bytes[inner_start..]) {
            Some(len) => {
                let close = inner_start + len;
                let content = &self.text[inner_start..close];
                self.emit(
                    Entity::InlineMath(Math {
                        content: Cow::Borrowed(content),
                    }),
                    close + 1,
                );
                Step::Continue
            }
            None => self.degrade_rest(MalformedKind::UnterminatedInlineMath),
        }
    }

    fn scan_link(&mut self) -> Step {
        let open = self.pos;
        let bytes = self.bytes;
        let brackets = self.brackets.get_or_insert_with(|| bracket_pairs(bytes));
        let close = brackets
            .binary_search_by_key(&open, |&(o, _)| o)
            .ok()
            .and_then(|i| brackets[i].1);
        let paren_follows = close.map_or(false, |c| bytes.get(c + 1) == Some(&b'('));

        if let (Some(close), true) = (close, paren_follows) {
            let url_start = close + 2;
            let found = match self.no_paren_from {
                Some(from) if url_start >= from => None,
                _ => memchr(b')', &bytes[url_start..]),
            };
            match found {
                Some(len) => {
                    let end = url_start + len;
                    let span = Entity::InlineLink(Link {
                        content: Cow::Borrowed(&self.text[open + 1..close]),
                        url: Cow::Borrowed(&self.text[url_start..end]),
                    });
                    self.emit(span, end + 1);
                    return Step::Continue;
                }
                None => self.no_paren_from = Some(url_start),
            }
        }

        if close.is_none() || paren_follows {
            self.malformed.push(Malformed {
                kind: MalformedKind::UnterminatedLink,
                offset: open,
            });
        }

        // Literal `[`, stays in the pending text run
        self.pos = open + 1;
        Step::Continue
    }
}

/// Pair each `[` with the `]` that balances it, in order of the opening
/// bracket. Unbalanced openers get `None`.
fn bracket_pairs(bytes: &[u8]) -> Vec<(usize, Option<usize>)> {
    let mut pairs = Vec::new();
    let mut open = Vec::new();
    for i in memchr2_iter(b'[', b']', bytes) {
        if bytes[i] == b'[' {
            open.push(pairs.len());
            pairs.push((i, None));
        } else if let Some(slot) = open.pop() {
            pairs[slot].1 = Some(i);
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Entity<'_> {
        Entity::Text(Text {
            content: Cow::Borrowed(s),
        })
    }

    #[test]
    fn plain_text_is_one_span() {
        assert_eq!(scan_inline("just words"), vec![text("just words")]);
    }

    #[test]
    fn empty_text_has_no_spans() {
        assert!(scan_inline("").is_empty());
    }

    #[test]
    fn display_math_wins_over_inline_math() {
        let spans = scan_inline("$$x$$");
        assert_eq!(
            spans,
            vec![Entity::DisplayMath(Math {
                content: Cow::Borrowed("x"),
            })]
        );
    }

    #[test]
    fn nested_brackets_in_link_text() {
        let spans = scan_inline("[a [b] c](url)");
        assert_eq!(
            spans,
            vec![Entity::InlineLink(Link {
                content: Cow::Borrowed("a [b] c"),
                url: Cow::Borrowed("url"),
            })]
        );
    }

    #[test]
    fn unmatched_dollar_is_literal() {
        let (spans, malformed) = InlineScanner::new("cost is $5").scan();
        assert_eq!(spans, vec![text("cost is $5")]);
        assert_eq!(
            malformed,
            vec![Malformed {
                kind: MalformedKind::UnterminatedInlineMath,
                offset: 8,
            }]
        );
    }

    #[test]
    fn unterminated_display_math_stops_scanning() {
        let (spans, malformed) = InlineScanner::new("a $$b [c](d)").scan();
        assert_eq!(spans, vec![text("a $$b [c](d)")]);
        assert_eq!(malformed[0].kind, MalformedKind::UnterminatedDisplayMath);
    }

    #[test]
    fn bracket_without_paren_is_literal() {
        let (spans, malformed) = InlineScanner::new("see [1] and $y$").scan();
        assert_eq!(
            spans,
            vec![
                text("see [1] and "),
                Entity::InlineMath(Math {
                    content: Cow::Borrowed("y"),
                }),
            ]
        );
        assert!(malformed.is_empty());
    }

    #[test]
    fn link_without_closing_paren_degrades() {
        let (spans, malformed) = InlineScanner::new("[a](b").scan();
        assert_eq!(spans, vec![text("[a](b")]);
        assert_eq!(malformed[0].kind, MalformedKind::UnterminatedLink);
    }

    #[test]
    fn unbalanced_opener_before_link() {
        let (spans, malformed) = InlineScanner::new("[[a](b)").scan();
        assert_eq!(
            spans,
            vec![
                text("["),
                Entity::InlineLink(Link {
                    content: Cow::Borrowed("a"),
                    url: Cow::Borrowed("b"),
                }),
            ]
        );
        assert_eq!(
            malformed,
            vec![Malformed {
                kind: MalformedKind::UnterminatedLink,
                offset: 0,
            }]
        );
    }

    #[test]
    fn long_runs_of_openers_stay_literal() {
        let line = "[".repeat(20_000);
        let (spans, malformed) = InlineScanner::new(&line).scan();
        assert_eq!(spans, vec![text(&line)]);
        assert_eq!(malformed.len(), 20_000);
        assert_eq!(malformed[19_999].offset, 19_999);

        let line = "[](".repeat(10_000);
        let (spans, malformed) = InlineScanner::new(&line).scan();
        assert_eq!(spans, vec![text(&line)]);
        assert_eq!(malformed.len(), 10_000);
    }

    #[test]
    fn mixed_spans_preserve_order() {
        let spans = scan_inline("Some text with [a link](http://x) and $y$.");
        assert_eq!(
            spans,
            vec![
                text("Some text with "),
                Entity::InlineLink(Link {
                    content: Cow::Borrowed("a link"),
                    url: Cow::Borrowed("http://x"),
                }),
                text(" and "),
                Entity::InlineMath(Math {
                    content: Cow::Borrowed("y"),
                }),
                text("."),
            ]
        );
    }

    #[test]
    fn multibyte_text_around_spans() {
        let spans = scan_inline("é $α$ ü");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2], text(" ü"));
    }
}
