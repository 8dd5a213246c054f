//! Structured rich text: blocks of paragraphs and lists made of marked runs.
//!
//! The serialized shape (`type` tags, `content` arrays) follows the common
//! editor document model so renderers can take it as-is.

use crate::style::TextAlign;
use serde::Serialize;

/// A formatting mark on a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Color { color: String },
    FontSize { size: f64 },
    FontFamily { family: String },
    Link { href: String },
}

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }
}

/// One paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Paragraph {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    /// Indent level (`a:pPr@lvl`), 0-based.
    #[serde(skip_serializing_if = "is_zero")]
    pub level: u32,
    pub content: Vec<TextRun>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.content.iter().map(|r| r.text.as_str()).collect()
    }
}

/// How a paragraph is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    None,
    Bullet,
    Ordered,
}

/// Top-level block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph(Paragraph),
    BulletList { content: Vec<Paragraph> },
    OrderedList { content: Vec<Paragraph> },
}

/// A rich-text document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RichText {
    #[serde(rename = "type")]
    kind: DocTag,
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
enum DocTag {
    #[default]
    Doc,
}

impl RichText {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single paragraph holding one run.
    pub fn single_run(run: TextRun) -> Self {
        let mut doc = Self::new();
        doc.push(
            Paragraph {
                content: vec![run],
                ..Paragraph::default()
            },
            ListKind::None,
        );
        doc
    }

    /// Append a paragraph, merging consecutive list items of the same kind.
    pub fn push(&mut self, paragraph: Paragraph, list: ListKind) {
        match (list, self.content.last_mut()) {
            (ListKind::Bullet, Some(Block::BulletList { content }))
            | (ListKind::Ordered, Some(Block::OrderedList { content })) => content.push(paragraph),
            (ListKind::Bullet, _) => self.content.push(Block::BulletList {
                content: vec![paragraph],
            }),
            (ListKind::Ordered, _) => self.content.push(Block::OrderedList {
                content: vec![paragraph],
            }),
            (ListKind::None, _) => self.content.push(Block::Paragraph(paragraph)),
        }
    }

    /// Paragraphs in order, flattening lists.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().flat_map(|block| match block {
            Block::Paragraph(p) => std::slice::from_ref(p).iter(),
            Block::BulletList { content } | Block::OrderedList { content } => content.iter(),
        })
    }

    /// Lossy conversion: run text concatenated, paragraphs separated by newlines.
    pub fn to_plain_text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_lists(&self) -> bool {
        self.content
            .iter()
            .any(|b| !matches!(b, Block::Paragraph(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Paragraph {
        Paragraph {
            content: vec![TextRun::plain(text)],
            ..Paragraph::default()
        }
    }

    #[test]
    fn test_consecutive_bullets_share_a_list() {
        let mut doc = RichText::new();
        doc.push(para("Heading"), ListKind::None);
        doc.push(para("one"), ListKind::Bullet);
        doc.push(para("two"), ListKind::Bullet);
        doc.push(para("first"), ListKind::Ordered);
        assert_eq!(doc.content.len(), 3);
        assert!(matches!(&doc.content[1], Block::BulletList { content } if content.len() == 2));
        assert!(doc.has_lists());
        assert_eq!(doc.to_plain_text(), "Heading\none\ntwo\nfirst");
    }

    #[test]
    fn test_serialized_shape() {
        let mut run = TextRun::plain("Hi");
        run.marks.push(Mark::Bold);
        run.marks.push(Mark::Color {
            color: "#FF0000".into(),
        });
        let doc = RichText::single_run(run);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "doc");
        assert_eq!(json["content"][0]["type"], "paragraph");
        assert_eq!(json["content"][0]["content"][0]["text"], "Hi");
        assert_eq!(json["content"][0]["content"][0]["marks"][0]["type"], "bold");
        assert_eq!(json["content"][0]["content"][0]["marks"][1]["color"], "#FF0000");
    }
}
