//! Rendered pages: the output of pagination

use crate::layout::PageGeometry;
use crate::render::FooterTemplate;
use serde::Serialize;
use std::ops::Range;

/// One page worth of markup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    /// 1-based page number
    pub index: usize,
    /// Manual section this page belongs to
    pub section: usize,
    /// Byte range of the page content in the source markup
    pub span: Range<usize>,
    /// Verbatim markup of the page
    pub markup: String,
    /// Measured content height
    pub height: f32,
    /// A single block taller than the content area
    pub overflow: bool,
}

impl RenderedPage {
    pub fn is_blank(&self) -> bool {
        self.markup.trim().is_empty()
    }
}

/// The ordered result of one pagination run. Never mutated in place:
/// re-pagination produces a fresh set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSet {
    pages: Vec<RenderedPage>,
    geometry: PageGeometry,
    content_hash: u64,
}

impl PageSet {
    pub(crate) fn new(pages: Vec<RenderedPage>, geometry: PageGeometry, content_hash: u64) -> Self {
        debug_assert!(!pages.is_empty());
        debug_assert!(pages.iter().enumerate().all(|(i, p)| p.index == i + 1));
        Self {
            pages,
            geometry,
            content_hash,
        }
    }

    /// Get total page count (always at least one)
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by 1-based index
    pub fn get(&self, index: usize) -> Option<&RenderedPage> {
        index.checked_sub(1).and_then(|i| self.pages.get(i))
    }

    pub fn pages(&self) -> &[RenderedPage] {
        &self.pages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenderedPage> {
        self.pages.iter()
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Hash of the source document this set was computed from
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    /// A single empty page
    pub fn is_blank(&self) -> bool {
        self.pages.len() == 1 && self.pages[0].is_blank()
    }

    /// Pages holding an element taller than the content area
    pub fn overflowing(&self) -> impl Iterator<Item = &RenderedPage> {
        self.pages.iter().filter(|p| p.overflow)
    }

    /// Footer text for a page
    pub fn footer(&self, template: &FooterTemplate, index: usize) -> String {
        template.render(index, self.total_pages())
    }

    /// Serialize pages and geometry as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<'a> IntoIterator for &'a PageSet {
    type Item = &'a RenderedPage;
    type IntoIter = std::slice::Iter<'a, RenderedPage>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}
