//! Block-level element classification

use std::ops::Range;

/// The kind of a top-level block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    /// Regular paragraph
    #[default]
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    /// `ul` / `ol`
    List { ordered: bool },
    Table,
    /// Pre-formatted text (whitespace preserved)
    Preformatted,
    /// Replaced content: `img`, `svg`, `canvas`
    Image,
    /// Horizontal rule
    Rule,
    /// Generic block container (`div`, `section`, ...)
    Container,
    /// Bare text at top level
    Text,
    /// Anything else (inline elements, unknown tags)
    Other,
}

impl BlockKind {
    /// Classify a lowercase tag name
    pub fn from_tag(name: &str) -> Self {
        match name {
            "p" => BlockKind::Paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name.as_bytes()[1] - b'0';
                BlockKind::Heading { level }
            }
            "ul" | "menu" | "dl" => BlockKind::List { ordered: false },
            "ol" => BlockKind::List { ordered: true },
            "table" => BlockKind::Table,
            "pre" => BlockKind::Preformatted,
            "img" | "svg" | "canvas" | "video" | "iframe" => BlockKind::Image,
            "hr" => BlockKind::Rule,
            "div" | "section" | "article" | "header" | "footer" | "main" | "aside" | "nav"
            | "blockquote" | "figure" | "form" | "address" | "fieldset" | "details" => {
                BlockKind::Container
            }
            _ => BlockKind::Other,
        }
    }

    /// Font size multiplier relative to the base size
    pub fn font_scale(&self) -> f32 {
        match self {
            BlockKind::Heading { level } => match level {
                1 => 2.0,
                2 => 1.5,
                3 => 1.17,
                4 => 1.0,
                5 => 0.83,
                _ => 0.67,
            },
            BlockKind::Preformatted => 0.9,
            _ => 1.0,
        }
    }

    /// Get the spacing after this block (in line heights)
    pub fn spacing_after(&self) -> f32 {
        match self {
            BlockKind::Paragraph | BlockKind::List { .. } | BlockKind::Preformatted => 1.0,
            BlockKind::Heading { .. } => 0.5,
            BlockKind::Table | BlockKind::Image | BlockKind::Rule => 0.5,
            BlockKind::Container | BlockKind::Text | BlockKind::Other => 0.0,
        }
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    /// Block kinds that start a new line group when nested
    pub fn is_block_tag(name: &str) -> bool {
        !matches!(BlockKind::from_tag(name), BlockKind::Other)
            || matches!(
                name,
                "li" | "tr" | "dt" | "dd" | "caption" | "figcaption" | "thead" | "tbody" | "tfoot"
            )
    }
}

/// A top-level block of a content document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Byte range of the block in the source markup
    pub span: Range<usize>,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(span: Range<usize>, kind: BlockKind) -> Self {
        Self { span, kind }
    }

    /// Get the markup of this block
    pub fn markup<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind() {
        assert_eq!(BlockKind::from_tag("p"), BlockKind::Paragraph);
        assert_eq!(BlockKind::from_tag("h3"), BlockKind::Heading { level: 3 });
        assert_eq!(BlockKind::from_tag("ol"), BlockKind::List { ordered: true });
        assert_eq!(BlockKind::from_tag("span"), BlockKind::Other);
        assert!(BlockKind::from_tag("h1").is_heading());
        assert!(!BlockKind::Paragraph.is_heading());
    }

    #[test]
    fn test_heading_scales_down_by_level() {
        let h1 = BlockKind::Heading { level: 1 }.font_scale();
        let h6 = BlockKind::Heading { level: 6 }.font_scale();
        assert!(h1 > h6);
        assert_eq!(BlockKind::Paragraph.font_scale(), 1.0);
    }

    #[test]
    fn test_block_tags() {
        assert!(BlockKind::is_block_tag("li"));
        assert!(BlockKind::is_block_tag("div"));
        assert!(!BlockKind::is_block_tag("strong"));
    }
}
