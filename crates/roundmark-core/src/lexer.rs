//! Separator-based line splitting.
//!
//! The block scanner consumes a document as a sequence of lines. This module
//! produces that sequence by splitting on an arbitrary separator string.
//!
//! # Performance
//!
//! - Zero-copy: lines borrow directly from input
//! - SIMD-accelerated scanning via `memchr` (single-byte separators) and
//!   `memchr::memmem` (multi-byte separators such as `\r\n`)

use memchr::{memchr, memmem};

use crate::error::{Error, Result};

/// Iterator over the lines of a document.
///
/// Every occurrence of the separator ends a line, so a document ending with
/// the separator yields a trailing empty line, and the empty document yields
/// exactly one empty line.
#[derive(Debug, Clone)]
pub struct Lines<'a, 's> {
    /// The complete input text.
    text: &'a str,
    separator: &'s str,
    /// Byte offset of the next line start.
    offset: usize,
    finished: bool,
}

impl<'a, 's> Lines<'a, 's> {
    /// Create a line iterator. The separator must not be empty.
    pub fn new(text: &'a str, separator: &'s str) -> Result<Self> {
        if separator.is_empty() {
            return Err(Error::EmptySeparator);
        }
        Ok(Self {
            text,
            separator,
            offset: 0,
            finished: false,
        })
    }

    /// Get the current byte offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    fn find_separator(&self) -> Option<usize> {
        let haystack = &self.text.as_bytes()[self.offset..];
        match self.separator.as_bytes() {
            [byte] => memchr(*byte, haystack),
            needle => memmem::find(haystack, needle),
        }
    }
}

impl<'a> Iterator for Lines<'a, '_> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.finished {
            return None;
        }

        let start = self.offset;
        match self.find_separator() {
            Some(pos) => {
                // Matches of a valid UTF-8 needle always sit on char boundaries.
                let end = start + pos;
                self.offset = end + self.separator.len();
                Some(&self.text[start..end])
            }
            None => {
                self.finished = true;
                self.offset = self.text.len();
                Some(&self.text[start..])
            }
        }
    }
}

/// Split `text` into lines at every occurrence of `separator`.
///
/// ```rust
/// use roundmark_core::lexer::split_lines;
///
/// let lines = split_lines("a\n\nb\n", "\n").unwrap();
/// assert_eq!(lines, vec!["a", "", "b", ""]);
/// ```
pub fn split_lines<'a>(text: &'a str, separator: &str) -> Result<Vec<&'a str>> {
    Ok(Lines::new(text, separator)?.collect())
}

/// Check if a line is empty or whitespace only.
#[inline(always)]
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Count the leading ASCII spaces of a line.
#[inline(always)]
pub fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// Count the leading `#` characters of a line.
#[inline(always)]
pub fn leading_hashes(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'#').count()
}
