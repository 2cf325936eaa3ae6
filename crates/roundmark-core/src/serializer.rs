//! Entity-to-text serializer.
//!
//! The inverse of the block scanner: renders each entity back to its literal
//! form and joins them with the line separator. Fenced code and `$$` blocks
//! use the same separator between their fence lines and body. Inline spans
//! are rendered with no separator between them, since a line's spans
//! re-concatenate to the line.

use crate::ast::{Entity, Link, ListItem, ListMarker};

/// How composite entities (list items, paragraphs) render their body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Use the stored flat `content`.
    #[default]
    Flat,
    /// Re-render the child spans.
    Spans,
}

/// Serializer with configurable separator and composite render mode.
#[derive(Debug, Clone)]
pub struct Serializer {
    separator: String,
    mode: RenderMode,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// Create a serializer joining entities with `\n`.
    #[inline]
    pub fn new() -> Self {
        Self {
            separator: String::from("\n"),
            mode: RenderMode::Flat,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Render a sequence of top-level entities.
    ///
    /// Entities are joined with the separator; nothing is appended after the
    /// last one, so a trailing newline in the source is carried by a trailing
    /// [`Entity::EmptyLine`].
    pub fn serialize(&self, entities: &[Entity]) -> String {
        let mut out = String::with_capacity(entities.len() * 32);
        for (i, entity) in entities.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.separator);
            }
            write_entity(entity, self.mode, &self.separator, &mut out);
        }
        out
    }

    /// Render a single entity in block context.
    pub fn render(&self, entity: &Entity) -> String {
        let mut out = String::new();
        write_entity(entity, self.mode, &self.separator, &mut out);
        out
    }
}

fn write_entity(entity: &Entity, mode: RenderMode, separator: &str, out: &mut String) {
    match entity {
        Entity::Title(title) => {
            for _ in 0..title.level {
                out.push('#');
            }
            out.push(' ');
            out.push_str(&title.content);
        }
        Entity::CodeBlock(code) => {
            out.push_str(code.fence.as_str());
            out.push_str(&code.language);
            out.push_str(separator);
            out.push_str(&code.content);
            out.push_str(separator);
            out.push_str(code.fence.as_str());
        }
        Entity::Link(link) | Entity::InlineLink(link) => write_link(link, out),
        Entity::Image(link) => {
            out.push('!');
            write_link(link, out);
        }
        Entity::EmptyLine(text) | Entity::Text(text) => out.push_str(&text.content),
        Entity::DisplayMath(math) => {
            out.push_str("$$");
            out.push_str(separator);
            out.push_str(&math.content);
            out.push_str(separator);
            out.push_str("$$");
        }
        Entity::InlineMath(math) => {
            out.push('$');
            out.push_str(&math.content);
            out.push('$');
        }
        Entity::ListItem(item) => {
            write_list_prefix(item, out);
            write_body(&item.content, &item.children, mode, out);
        }
        Entity::Paragraph(paragraph) => {
            write_body(&paragraph.content, &paragraph.children, mode, out);
        }
    }
}

fn write_body(content: &str, children: &[Entity], mode: RenderMode, out: &mut String) {
    match mode {
        RenderMode::Flat => out.push_str(content),
        RenderMode::Spans => {
            for child in children {
                write_span(child, out);
            }
        }
    }
}

/// Render an inline span. Display math found mid-line stays on one line.
fn write_span(entity: &Entity, out: &mut String) {
    match entity {
        Entity::DisplayMath(math) => {
            out.push_str("$$");
            out.push_str(&math.content);
            out.push_str("$$");
        }
        other => write_entity(other, RenderMode::Flat, "\n", out),
    }
}

/// Concatenate the renderings of inline spans.
pub fn render_spans(spans: &[Entity]) -> String {
    let mut out = String::new();
    for span in spans {
        write_span(span, &mut out);
    }
    out
}

fn write_link(link: &Link, out: &mut String) {
    out.push('[');
    out.push_str(&link.content);
    out.push_str("](");
    out.push_str(&link.url);
    out.push(')');
}

fn write_list_prefix(item: &ListItem, out: &mut String) {
    for _ in 0..item.indent {
        out.push(' ');
    }
    match item.marker {
        ListMarker::Bullet(bullet) => out.push(bullet),
        ListMarker::Ordered(index) => {
            out.push_str(&index.to_string());
            out.push('.');
        }
    }
    out.push(' ');
}

/// Serialize entities with the default settings.
#[inline]
pub fn serialize(entities: &[Entity]) -> String {
    Serializer::new().serialize(entities)
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::ast::{CodeBlock, Fence, Math, Paragraph, Text, Title};

    #[test]
    fn literal_forms() {
        let ser = Serializer::new();
        let title = Entity::Title(Title {
            content: Cow::Borrowed("Intro"),
            level: 3,
        });
        assert_eq!(ser.render(&title), "### Intro");

        let code = Entity::CodeBlock(CodeBlock {
            content: Cow::Borrowed("a\nb"),
            language: Cow::Borrowed("sh"),
            fence: Fence::Tilde,
        });
        assert_eq!(ser.render(&code), "~~~sh\na\nb\n~~~");

        let image = Entity::Image(Link {
            content: Cow::Borrowed("alt"),
            url: Cow::Borrowed("img.png"),
        });
        assert_eq!(ser.render(&image), "![alt](img.png)");

        let math = Entity::DisplayMath(Math {
            content: Cow::Borrowed("x^2"),
        });
        assert_eq!(ser.render(&math), "$$\nx^2\n$$");
    }

    #[test]
    fn list_items_keep_layout() {
        let ser = Serializer::new();
        let ordered = Entity::ListItem(ListItem::new("step", 0, ListMarker::Ordered(7)));
        assert_eq!(ser.render(&ordered), "7. step");

        let nested = Entity::ListItem(ListItem::new("deep", 4, ListMarker::Bullet('+')));
        assert_eq!(ser.render(&nested), "    + deep");
    }

    #[test]
    fn render_modes_agree_on_scanned_composites() {
        let para = Entity::Paragraph(Paragraph::new("a $$b$$ c [d](e) $f$"));
        let flat = Serializer::new().render(&para);
        let spans = Serializer::new().with_mode(RenderMode::Spans).render(&para);
        assert_eq!(flat, "a $$b$$ c [d](e) $f$");
        assert_eq!(flat, spans);
    }

    #[test]
    fn joins_without_trailing_separator() {
        let entities = vec![
            Entity::Text(Text {
                content: Cow::Borrowed("a"),
            }),
            Entity::EmptyLine(Text {
                content: Cow::Borrowed(""),
            }),
        ];
        assert_eq!(serialize(&entities), "a\n");
        assert_eq!(
            Serializer::new().with_separator("\r\n").serialize(&entities),
            "a\r\n"
        );
        assert_eq!(serialize(&[]), "");
    }

    #[test]
    fn block_bodies_use_the_separator() {
        let ser = Serializer::new().with_separator("\r\n");
        let code = Entity::CodeBlock(CodeBlock {
            content: Cow::Borrowed("a\r\nb"),
            language: Cow::Borrowed("sh"),
            fence: Fence::Backtick,
        });
        assert_eq!(ser.render(&code), "```sh\r\na\r\nb\r\n```");

        let math = Entity::DisplayMath(Math {
            content: Cow::Borrowed("x"),
        });
        assert_eq!(ser.render(&math), "$$\r\nx\r\n$$");
    }
}
