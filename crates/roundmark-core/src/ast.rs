//! Entity types produced by the block scanner.
//!
//! A parsed document is a flat, ordered sequence of [`Entity`] values. Most
//! entities are leaves; [`ListItem`] and [`Paragraph`] are composite and own
//! the inline spans their line was decomposed into.
//!
//! Entities are:
//!
//! - **Zero-copy where possible**: payloads are `Cow<'a, str>` borrowing from
//!   the input lines; only text assembled from several lines is owned
//! - **Lossless**: every field needed to reproduce the source line is kept
//!   (fence style, list indentation, bullet character)
//! - **Closed**: the serializer matches exhaustively over [`Entity`]

use std::borrow::Cow;
use std::fmt;

use crate::inline::scan_inline;
use crate::serializer::render_spans;

/// Borrowed or owned string type for zero-copy parsing.
pub type CowStr<'a> = Cow<'a, str>;

/// The two interchangeable code fence markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fence {
    /// Three backticks.
    #[default]
    Backtick,
    /// Three tildes.
    Tilde,
}

impl Fence {
    /// The literal marker string.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Fence::Backtick => "```",
            Fence::Tilde => "~~~",
        }
    }

    /// Detect which fence, if any, a line starts with.
    #[inline]
    pub fn detect(line: &str) -> Option<Fence> {
        if line.starts_with("```") {
            Some(Fence::Backtick)
        } else if line.starts_with("~~~") {
            Some(Fence::Tilde)
        } else {
            None
        }
    }
}

impl fmt::Display for Fence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed structural unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity<'a> {
    /// `#`-prefixed heading line.
    Title(Title<'a>),
    /// Fenced code block.
    CodeBlock(CodeBlock<'a>),
    /// A line consisting of exactly one `[text](url)`.
    Link(Link<'a>),
    /// A line consisting of exactly one `![text](url)`.
    Image(Link<'a>),
    /// Blank (or whitespace-only) line.
    EmptyLine(Text<'a>),
    /// Literal text run inside a composite.
    Text(Text<'a>),
    /// `$$`-delimited math, either a block or found mid-line.
    DisplayMath(Math<'a>),
    /// `$`-delimited inline math.
    InlineMath(Math<'a>),
    /// `[text](url)` found inside a line.
    InlineLink(Link<'a>),
    /// Ordered or unordered list item.
    ListItem(ListItem<'a>),
    /// Any other non-blank line.
    Paragraph(Paragraph<'a>),
}

/// Discriminant of an [`Entity`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Title,
    CodeBlock,
    Link,
    Image,
    EmptyLine,
    Text,
    DisplayMath,
    InlineMath,
    InlineLink,
    OrderedListItem,
    UnorderedListItem,
    Paragraph,
}

impl EntityKind {
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Title => "Title",
            EntityKind::CodeBlock => "CodeBlock",
            EntityKind::Link => "Link",
            EntityKind::Image => "Image",
            EntityKind::EmptyLine => "EmptyLine",
            EntityKind::Text => "Text",
            EntityKind::DisplayMath => "DisplayMath",
            EntityKind::InlineMath => "InlineMath",
            EntityKind::InlineLink => "InlineLink",
            EntityKind::OrderedListItem => "OrderedListItem",
            EntityKind::UnorderedListItem => "UnorderedListItem",
            EntityKind::Paragraph => "Paragraph",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Heading with its marker count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title<'a> {
    /// Heading text with surrounding whitespace removed.
    pub content: CowStr<'a>,
    /// Number of leading `#` characters (at least 1).
    pub level: usize,
}

/// Fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// Body lines joined by `\n`, fence lines excluded.
    pub content: CowStr<'a>,
    /// Text following the opening fence on the same line.
    pub language: CowStr<'a>,
    /// Fence that opened (and must close) the block.
    pub fence: Fence,
}

/// Link-shaped payload shared by whole-line links, images, and inline links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link<'a> {
    /// Text between the brackets (alt text for images).
    pub content: CowStr<'a>,
    /// Text between the parentheses.
    pub url: CowStr<'a>,
}

/// Plain textual payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text<'a> {
    pub content: CowStr<'a>,
}

/// Math payload without its `$` delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Math<'a> {
    pub content: CowStr<'a>,
}

/// Marker that introduced a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListMarker {
    /// `-`, `*` or `+`.
    Bullet(char),
    /// `<digits>.`, kept as written (never renumbered).
    Ordered(u64),
}

impl Default for ListMarker {
    fn default() -> Self {
        ListMarker::Bullet('-')
    }
}

/// A single list item line, decomposed into inline spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem<'a> {
    /// Text after the marker and its separating space.
    pub content: CowStr<'a>,
    /// Nesting depth, two spaces of indentation per level.
    pub level: usize,
    /// Leading space count of the source line.
    pub indent: usize,
    pub marker: ListMarker,
    /// Inline spans of `content`.
    pub children: Vec<Entity<'a>>,
}

impl<'a> ListItem<'a> {
    /// Build a list item and scan its content into spans.
    pub fn new(content: impl Into<CowStr<'a>>, indent: usize, marker: ListMarker) -> Self {
        let content = content.into();
        let children = scan_children(&content);
        Self {
            content,
            level: indent / 2,
            indent,
            marker,
            children,
        }
    }

    /// Build a list item from spans already scanned out of `content`.
    pub fn from_spans(
        content: impl Into<CowStr<'a>>,
        indent: usize,
        marker: ListMarker,
        children: Vec<Entity<'a>>,
    ) -> Self {
        Self {
            content: content.into(),
            level: indent / 2,
            indent,
            marker,
            children,
        }
    }

    /// The literal numeric prefix of an ordered item.
    #[inline]
    pub fn index(&self) -> Option<u64> {
        match self.marker {
            ListMarker::Ordered(index) => Some(index),
            ListMarker::Bullet(_) => None,
        }
    }

    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.index().is_some()
    }
}

/// A non-blank line that is not any other block construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph<'a> {
    /// Flat text of the line; equals the concatenated rendering of `children`.
    pub content: CowStr<'a>,
    pub children: Vec<Entity<'a>>,
}

impl<'a> Paragraph<'a> {
    /// Build a paragraph by scanning `content` into spans.
    pub fn new(content: impl Into<CowStr<'a>>) -> Self {
        let content = content.into();
        let children = scan_children(&content);
        Self { content, children }
    }

    /// Build a paragraph from already-scanned spans, deriving `content` from them.
    pub fn from_spans(children: Vec<Entity<'a>>) -> Self {
        Self {
            content: Cow::Owned(render_spans(&children)),
            children,
        }
    }
}

/// Scan composite content into spans, borrowing when the content is borrowed.
fn scan_children<'a>(content: &CowStr<'a>) -> Vec<Entity<'a>> {
    match content {
        Cow::Borrowed(text) => scan_inline(text),
        Cow::Owned(text) => scan_inline(text)
            .into_iter()
            .map(|span| -> Entity<'a> { span.into_owned() })
            .collect(),
    }
}

impl<'a> Entity<'a> {
    /// The raw textual payload of this entity.
    pub fn content(&self) -> &CowStr<'a> {
        match self {
            Entity::Title(t) => &t.content,
            Entity::CodeBlock(c) => &c.content,
            Entity::Link(l) | Entity::Image(l) | Entity::InlineLink(l) => &l.content,
            Entity::EmptyLine(t) | Entity::Text(t) => &t.content,
            Entity::DisplayMath(m) | Entity::InlineMath(m) => &m.content,
            Entity::ListItem(item) => &item.content,
            Entity::Paragraph(p) => &p.content,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Title(_) => EntityKind::Title,
            Entity::CodeBlock(_) => EntityKind::CodeBlock,
            Entity::Link(_) => EntityKind::Link,
            Entity::Image(_) => EntityKind::Image,
            Entity::EmptyLine(_) => EntityKind::EmptyLine,
            Entity::Text(_) => EntityKind::Text,
            Entity::DisplayMath(_) => EntityKind::DisplayMath,
            Entity::InlineMath(_) => EntityKind::InlineMath,
            Entity::InlineLink(_) => EntityKind::InlineLink,
            Entity::ListItem(item) if item.is_ordered() => EntityKind::OrderedListItem,
            Entity::ListItem(_) => EntityKind::UnorderedListItem,
            Entity::Paragraph(_) => EntityKind::Paragraph,
        }
    }

    /// Child spans of a composite entity; empty for leaves.
    pub fn children(&self) -> &[Entity<'a>] {
        match self {
            Entity::ListItem(item) => &item.children,
            Entity::Paragraph(p) => &p.children,
            _ => &[],
        }
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Entity::ListItem(_) | Entity::Paragraph(_))
    }

    /// A fresh entity of the same kind carrying only this entity's content.
    ///
    /// Every other field takes its default. Composite copies rescan the
    /// copied content instead of cloning the original children.
    pub fn copy(&self) -> Entity<'a> {
        let content = self.content().clone();
        match self {
            Entity::Title(_) => Entity::Title(Title { content, level: 1 }),
            Entity::CodeBlock(_) => Entity::CodeBlock(CodeBlock {
                content,
                language: Cow::Borrowed(""),
                fence: Fence::default(),
            }),
            Entity::Link(_) => Entity::Link(Link {
                content,
                url: Cow::Borrowed(""),
            }),
            Entity::Image(_) => Entity::Image(Link {
                content,
                url: Cow::Borrowed(""),
            }),
            Entity::InlineLink(_) => Entity::InlineLink(Link {
                content,
                url: Cow::Borrowed(""),
            }),
            Entity::EmptyLine(_) => Entity::EmptyLine(Text { content }),
            Entity::Text(_) => Entity::Text(Text { content }),
            Entity::DisplayMath(_) => Entity::DisplayMath(Math { content }),
            Entity::InlineMath(_) => Entity::InlineMath(Math { content }),
            Entity::ListItem(_) => {
                Entity::ListItem(ListItem::new(content, 0, ListMarker::default()))
            }
            Entity::Paragraph(_) => Entity::Paragraph(Paragraph::new(content)),
        }
    }

    /// Detach this entity from the input it borrows from.
    pub fn into_owned(self) -> Entity<'static> {
        fn own(s: CowStr<'_>) -> CowStr<'static> {
            Cow::Owned(s.into_owned())
        }
        fn own_link(l: Link<'_>) -> Link<'static> {
            Link {
                content: own(l.content),
                url: own(l.url),
            }
        }

        match self {
            Entity::Title(t) => Entity::Title(Title {
                content: own(t.content),
                level: t.level,
            }),
            Entity::CodeBlock(c) => Entity::CodeBlock(CodeBlock {
                content: own(c.content),
                language: own(c.language),
                fence: c.fence,
            }),
            Entity::Link(l) => Entity::Link(own_link(l)),
            Entity::Image(l) => Entity::Image(own_link(l)),
            Entity::InlineLink(l) => Entity::InlineLink(own_link(l)),
            Entity::EmptyLine(t) => Entity::EmptyLine(Text {
                content: own(t.content),
            }),
            Entity::Text(t) => Entity::Text(Text {
                content: own(t.content),
            }),
            Entity::DisplayMath(m) => Entity::DisplayMath(Math {
                content: own(m.content),
            }),
            Entity::InlineMath(m) => Entity::InlineMath(Math {
                content: own(m.content),
            }),
            Entity::ListItem(item) => Entity::ListItem(ListItem {
                content: own(item.content),
                level: item.level,
                indent: item.indent,
                marker: item.marker,
                children: item.children.into_iter().map(Entity::into_owned).collect(),
            }),
            Entity::Paragraph(p) => Entity::Paragraph(Paragraph {
                content: own(p.content),
                children: p.children.into_iter().map(Entity::into_owned).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_resets_non_content_fields() {
        let title = Entity::Title(Title {
            content: Cow::Borrowed("Deep"),
            level: 4,
        });
        assert_eq!(
            title.copy(),
            Entity::Title(Title {
                content: Cow::Borrowed("Deep"),
                level: 1,
            })
        );

        let code = Entity::CodeBlock(CodeBlock {
            content: Cow::Borrowed("x = 1"),
            language: Cow::Borrowed("python"),
            fence: Fence::Tilde,
        });
        match code.copy() {
            Entity::CodeBlock(c) => {
                assert_eq!(c.content, "x = 1");
                assert_eq!(c.language, "");
                assert_eq!(c.fence, Fence::Backtick);
            }
            other => panic!("Expected code block, got {:?}", other),
        }
    }

    #[test]
    fn copy_rescans_composite_content() {
        let item = Entity::ListItem(ListItem::new("see $x$", 4, ListMarker::Ordered(3)));
        let copied = item.copy();
        match &copied {
            Entity::ListItem(item) => {
                assert_eq!(item.level, 0);
                assert_eq!(item.marker, ListMarker::Bullet('-'));
                assert_eq!(item.children.len(), 2);
            }
            other => panic!("Expected list item, got {:?}", other),
        }
        assert_eq!(copied.kind(), EntityKind::UnorderedListItem);
    }

    #[test]
    fn owned_composite_content_keeps_children() {
        let para = Paragraph::new(String::from("a [b](c)"));
        assert_eq!(para.children.len(), 2);
        assert!(matches!(&para.children[1], Entity::InlineLink(l) if l.url == "c"));
    }

    #[test]
    fn kind_distinguishes_list_orderings() {
        let ordered = Entity::ListItem(ListItem::new("x", 0, ListMarker::Ordered(1)));
        let unordered = Entity::ListItem(ListItem::new("x", 0, ListMarker::Bullet('*')));
        assert_eq!(ordered.kind(), EntityKind::OrderedListItem);
        assert_eq!(unordered.kind(), EntityKind::UnorderedListItem);
        assert_eq!(ordered.kind().to_string(), "OrderedListItem");
    }

    #[test]
    fn fence_detection() {
        assert_eq!(Fence::detect("```rust"), Some(Fence::Backtick));
        assert_eq!(Fence::detect("~~~"), Some(Fence::Tilde));
        assert_eq!(Fence::detect("``"), None);
        assert_eq!(Fence::detect(" ```"), None);
    }
}
