//! Content document model: top-level blocks and manual sections

mod block;
mod breaks;
pub mod scanner;

pub use block::{Block, BlockKind};
pub use breaks::{break_marker, is_break_marker, BreakMarker};
pub use scanner::{Node, NodeKind, StartTag};

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

/// A contiguous slice of the document between manual break markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualSection {
    /// 0-based position of this section in the document
    pub ordinal: usize,
    /// Byte range in the source, markers excluded
    pub span: Range<usize>,
    /// Top-level blocks in document order
    pub blocks: Vec<Block>,
}

impl ManualSection {
    /// A section with no visible blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the markup of this section
    pub fn markup<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

/// An immutable rich-text document ready for pagination
#[derive(Debug, Clone)]
pub struct ContentDocument {
    source: String,
    sections: Vec<ManualSection>,
    marker_count: usize,
    content_hash: u64,
}

impl Default for ContentDocument {
    fn default() -> Self {
        Self::parse("")
    }
}

impl ContentDocument {
    /// Parse markup and split it on manual break markers
    pub fn parse(markup: &str) -> Self {
        let source = markup.to_string();
        let nodes = scanner::scan(&source);

        let mut sections = Vec::new();
        let mut blocks = Vec::new();
        let mut section_start = 0;
        let mut after_marker = false;
        let mut marker_count = 0;

        for node in &nodes {
            let marker = breaks::break_marker(&source, node);
            if let Some(marker) = marker {
                let start = if after_marker {
                    skip_whitespace(&source, section_start)
                } else {
                    section_start
                };
                let end = trim_whitespace_end(&source, start, node.span.start);
                sections.push(ManualSection {
                    ordinal: sections.len(),
                    span: start..end,
                    blocks: std::mem::take(&mut blocks),
                });
                after_marker = true;
                marker_count += 1;
                if marker == BreakMarker::Standalone {
                    section_start = node.span.end;
                    continue;
                }
                // The flagged element opens the next section
                section_start = node.span.start;
            }

            match &node.kind {
                NodeKind::Comment { .. } => {}
                NodeKind::Text => blocks.push(Block::new(node.span.clone(), BlockKind::Text)),
                NodeKind::Element { tag, .. } => {
                    if breaks::contains_nested_marker(&source, node) {
                        log::debug!(
                            "ignoring page-break marker nested in <{}> at byte {}",
                            tag.name,
                            node.span.start
                        );
                    }
                    blocks.push(Block::new(node.span.clone(), BlockKind::from_tag(&tag.name)));
                }
            }
        }

        let start = if after_marker {
            skip_whitespace(&source, section_start)
        } else {
            section_start
        };
        sections.push(ManualSection {
            ordinal: sections.len(),
            span: start..source.len().max(start),
            blocks,
        });

        let content_hash = hash_text(&source);

        Self {
            source,
            sections,
            marker_count,
            content_hash,
        }
    }

    /// Get the raw markup
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Manual sections in order (never empty)
    pub fn sections(&self) -> &[ManualSection] {
        &self.sections
    }

    /// Number of manual break markers found at top level
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Check if the document has no visible content
    pub fn is_blank(&self) -> bool {
        self.sections.iter().all(ManualSection::is_empty)
    }

    /// Hash of the source for change detection
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }
}

fn skip_whitespace(src: &str, from: usize) -> usize {
    let rest = &src[from..];
    from + (rest.len() - rest.trim_start().len())
}

fn trim_whitespace_end(src: &str, start: usize, end: usize) -> usize {
    start + src[start..end].trim_end().len()
}

/// Hash text content for change detection
pub(crate) fn hash_text(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}
