//! Print pagination: manual breaks plus greedy height fitting

use crate::document::{ContentDocument, ManualSection};
use crate::error::Result;
use crate::layout::font::Typography;
use crate::layout::geometry::PageGeometry;
use crate::layout::oracle::{LayoutOracle, MeasureScope};
use crate::render::{PageSet, RenderedPage};
use std::ops::Range;

/// Tolerance on height comparisons. Measured heights are approximate
/// (sub-pixel rounding, font loading), so exact fits are best-effort.
pub const HEIGHT_EPSILON: f32 = 0.5;

/// Paginate a document in one call.
///
/// Manual break markers are hard boundaries. Within a section, top-level
/// blocks are packed greedily; a block taller than the content area gets a
/// page of its own. Empty content yields exactly one blank page.
pub fn paginate<O: LayoutOracle + ?Sized>(
    document: &ContentDocument,
    geometry: &PageGeometry,
    typography: &Typography,
    oracle: &mut O,
) -> Result<PageSet> {
    PaginationRun::new(document, geometry, typography, oracle)?.finish()
}

/// An in-progress pagination that can yield between manual sections.
///
/// The measurement scope stays open for the life of the run and is released
/// when the run finishes or is dropped.
pub struct PaginationRun<'a, O: LayoutOracle + ?Sized> {
    document: &'a ContentDocument,
    available: f32,
    geometry: PageGeometry,
    scope: MeasureScope<'a, O>,
    next_section: usize,
    pages: Vec<RenderedPage>,
}

impl<'a, O: LayoutOracle + ?Sized> PaginationRun<'a, O> {
    /// Validate geometry and open the measurement scope
    pub fn new(
        document: &'a ContentDocument,
        geometry: &PageGeometry,
        typography: &'a Typography,
        oracle: &'a mut O,
    ) -> Result<Self> {
        geometry.validate()?;
        let scope = MeasureScope::open(oracle, geometry.content_width(), typography)?;

        Ok(Self {
            document,
            available: geometry.content_height(),
            geometry: *geometry,
            scope,
            next_section: 0,
            pages: Vec::new(),
        })
    }

    /// Check if every section has been processed
    pub fn is_done(&self) -> bool {
        self.next_section >= self.document.sections().len()
    }

    /// Pages emitted so far
    pub fn pages_so_far(&self) -> usize {
        self.pages.len()
    }

    /// Paginate the next manual section. Returns `false` once done.
    pub fn step(&mut self) -> Result<bool> {
        let document = self.document;
        let Some(section) = document.sections().get(self.next_section) else {
            return Ok(false);
        };
        self.paginate_section(section)?;
        self.next_section += 1;
        Ok(!self.is_done())
    }

    /// Run remaining sections and number the pages
    pub fn finish(mut self) -> Result<PageSet> {
        while self.step()? {}

        let mut pages = std::mem::take(&mut self.pages);
        if pages.is_empty() {
            pages.push(RenderedPage {
                index: 0,
                section: 0,
                span: 0..0,
                markup: String::new(),
                height: 0.0,
                overflow: false,
            });
        }
        for (i, page) in pages.iter_mut().enumerate() {
            page.index = i + 1;
        }

        log::debug!(
            "paginated {} bytes into {} page(s) across {} section(s)",
            self.document.source().len(),
            pages.len(),
            self.document.sections().len()
        );

        Ok(PageSet::new(
            pages,
            self.geometry,
            self.document.content_hash(),
        ))
    }

    fn paginate_section(&mut self, section: &ManualSection) -> Result<()> {
        if section.is_empty() {
            return Ok(());
        }

        let document = self.document;
        let source = document.source();
        let total = self
            .scope
            .measure(section.markup(source), section.span.start)?;

        if total <= self.available + HEIGHT_EPSILON {
            self.emit(section.ordinal, section.span.clone(), total);
            return Ok(());
        }

        let blocks = &section.blocks;
        let mut first: Option<usize> = None;
        let mut accumulated: f32 = 0.0;

        for (i, block) in blocks.iter().enumerate() {
            let height = self.scope.measure(block.markup(source), block.span.start)?;

            match first {
                Some(start) if accumulated + height > self.available + HEIGHT_EPSILON => {
                    let span = blocks[start].span.start..blocks[i - 1].span.end;
                    self.emit(section.ordinal, span, accumulated);
                    first = Some(i);
                    accumulated = height;
                }
                Some(_) => accumulated += height,
                None => {
                    first = Some(i);
                    accumulated = height;
                }
            }
        }

        if let (Some(start), Some(last)) = (first, blocks.last()) {
            let span = blocks[start].span.start..last.span.end;
            self.emit(section.ordinal, span, accumulated);
        }

        Ok(())
    }

    fn emit(&mut self, section: usize, span: Range<usize>, height: f32) {
        let overflow = height > self.available + HEIGHT_EPSILON;
        if overflow {
            log::warn!(
                "block at byte {} is {:.1}px tall, exceeding the {:.1}px content area",
                span.start,
                height,
                self.available
            );
        }
        self.pages.push(RenderedPage {
            index: 0,
            section,
            markup: self.document.source()[span.clone()].to_string(),
            span,
            height,
            overflow,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaginationError;
    use crate::layout::oracle::testing::StubOracle;

    /// Content area of exactly 100px
    fn geometry() -> PageGeometry {
        PageGeometry {
            page_width: 300.0,
            page_height: 160.0,
            margin_top: 20.0,
            margin_bottom: 20.0,
            margin_left: 20.0,
            margin_right: 20.0,
            footer_height: 20.0,
            dpi: 96.0,
        }
    }

    fn run(content: &str, oracle: &mut StubOracle) -> Result<PageSet> {
        let doc = ContentDocument::parse(content);
        paginate(&doc, &geometry(), &Typography::default(), oracle)
    }

    fn markups(set: &PageSet) -> Vec<&str> {
        set.iter().map(|p| p.markup.as_str()).collect()
    }

    #[test]
    fn test_content_that_fits_is_one_verbatim_page() {
        let content = "<h1>Convocation</h1>\n<p>Madame, Monsieur,</p>\n";
        let mut oracle = StubOracle::new(30.0).with(content, 80.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(set.total_pages(), 1);
        assert_eq!(set.pages()[0].markup, content);
        assert_eq!(set.pages()[0].index, 1);
        assert!(!set.pages()[0].overflow);
    }

    #[test]
    fn test_three_paragraphs_at_forty_percent() {
        let content = "<p>one</p><p>two</p><p>three</p>";
        let mut oracle = StubOracle::new(40.0).with(content, 120.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(markups(&set), vec!["<p>one</p><p>two</p>", "<p>three</p>"]);
        assert_eq!(set.pages()[0].height, 80.0);
        assert_eq!(set.get(2).unwrap().index, 2);
    }

    #[test]
    fn test_manual_break_and_oversized_block() {
        let content = "<p>Intro</p><div class=\"page-break\"></div><p>Body</p>";
        let mut oracle = StubOracle::new(10.0).with("<p>Body</p>", 150.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(markups(&set), vec!["<p>Intro</p>", "<p>Body</p>"]);
        assert_eq!(set.pages()[0].section, 0);
        assert_eq!(set.pages()[1].section, 1);
        assert!(set.pages()[1].overflow);
        assert_eq!(set.overflowing().count(), 1);
    }

    #[test]
    fn test_oversized_block_between_others_gets_own_page() {
        let content = "<p>a</p><table>big</table><p>b</p>";
        let mut oracle = StubOracle::new(30.0)
            .with(content, 300.0)
            .with("<table>big</table>", 250.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(
            markups(&set),
            vec!["<p>a</p>", "<table>big</table>", "<p>b</p>"]
        );
        assert_eq!(
            set.iter().map(|p| p.overflow).collect::<Vec<_>>(),
            vec![false, true, false]
        );
    }

    #[test]
    fn test_split_pages_reconstruct_block_sequence() {
        let blocks: Vec<String> = (0..9).map(|i| format!("<p>Ligne {}</p>", i)).collect();
        let content = blocks.join("\n");
        let mut oracle = StubOracle::new(35.0).with(&content, 315.0);
        let set = run(&content, &mut oracle).unwrap();
        assert!(set.total_pages() > 1);

        let mut rebuilt = Vec::new();
        for page in &set {
            let doc = ContentDocument::parse(&page.markup);
            for block in &doc.sections()[0].blocks {
                rebuilt.push(block.markup(&page.markup).to_string());
            }
        }
        assert_eq!(rebuilt, blocks);
    }

    #[test]
    fn test_pages_never_mix_sections() {
        let content = "<p>a</p><p>b</p><!-- pagebreak --><p>c</p><p>d</p><!-- pagebreak --><p>e</p>";
        let mut oracle = StubOracle::new(60.0)
            .with("<p>a</p><p>b</p>", 120.0)
            .with("<p>c</p><p>d</p>", 120.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(set.total_pages(), 5);
        assert_eq!(
            set.iter().map(|p| p.section).collect::<Vec<_>>(),
            vec![0, 0, 1, 1, 2]
        );
        for page in &set {
            assert!(!page.markup.contains("pagebreak"));
        }
    }

    #[test]
    fn test_empty_content_yields_one_blank_page() {
        let mut oracle = StubOracle::new(10.0);
        let set = run("", &mut oracle).unwrap();
        assert_eq!(set.total_pages(), 1);
        assert!(set.is_blank());
        assert_eq!(set.pages()[0].index, 1);
        assert!(oracle.measured.is_empty());
    }

    #[test]
    fn test_whitespace_and_comment_only_content_is_blank() {
        for content in [" \n\t ", "<!-- note -->", "\n<!-- note -->\n"] {
            let mut oracle = StubOracle::new(10.0);
            let set = run(content, &mut oracle).unwrap();
            assert_eq!(set.total_pages(), 1, "content {:?}", content);
            assert!(set.is_blank());
            assert!(oracle.measured.is_empty());
            assert_eq!(oracle.open_scaffolds, 0);
        }
    }

    #[test]
    fn test_flagged_heading_is_kept_on_next_page() {
        let content = "<p>Intro</p><h2 class=\"page-break\">Chapitre 2</h2><p>Body</p>";
        let mut oracle = StubOracle::new(10.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(
            markups(&set),
            vec![
                "<p>Intro</p>",
                "<h2 class=\"page-break\">Chapitre 2</h2><p>Body</p>"
            ]
        );
        assert!(set.iter().any(|p| p.markup.contains("Chapitre 2")));
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let content = "<!-- pagebreak --><p>a</p><!-- pagebreak --><!-- pagebreak -->";
        let mut oracle = StubOracle::new(10.0);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(markups(&set), vec!["<p>a</p>"]);
        assert_eq!(set.pages()[0].section, 1);

        let set = run("<!-- pagebreak -->", &mut oracle).unwrap();
        assert!(set.is_blank());
    }

    #[test]
    fn test_idempotent() {
        let content = "<p>one</p><p>two</p><p>three</p><hr class=\"page-break\"><p>four</p>";
        let mut first = StubOracle::new(45.0).with("<p>one</p><p>two</p><p>three</p>", 135.0);
        let mut second = StubOracle::new(45.0).with("<p>one</p><p>two</p><p>three</p>", 135.0);
        let a = run(content, &mut first).unwrap();
        let b = run(content, &mut second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_geometry_rejected_before_measuring() {
        let doc = ContentDocument::parse("<p>x</p>");
        let mut bad = geometry();
        bad.margin_top = 100.0;
        bad.margin_bottom = 60.0;
        let mut oracle = StubOracle::new(10.0);
        let result = paginate(&doc, &bad, &Typography::default(), &mut oracle);
        assert!(matches!(result, Err(PaginationError::InvalidGeometry(_))));
        assert_eq!(oracle.prepared, 0);
    }

    #[test]
    fn test_unavailable_layout_engine() {
        let mut oracle = StubOracle::new(10.0);
        oracle.unavailable = true;
        assert!(matches!(
            run("<p>x</p>", &mut oracle),
            Err(PaginationError::LayoutUnavailable)
        ));
    }

    #[test]
    fn test_measurement_failure_releases_scaffold() {
        let content = "<p>a</p><p>boom</p>";
        let mut oracle = StubOracle::new(80.0).with(content, 160.0);
        oracle.fail_on = Some("<p>boom</p>".into());
        let result = run(content, &mut oracle);
        match result {
            Err(PaginationError::Measurement { offset, .. }) => assert_eq!(offset, 8),
            other => panic!("expected measurement error, got {:?}", other),
        }
        assert_eq!(oracle.open_scaffolds, 0);
        assert_eq!(oracle.released, 1);
    }

    #[test]
    fn test_incremental_run_yields_per_section() {
        let doc = ContentDocument::parse("<p>a</p><!-- pagebreak --><p>b</p><!-- pagebreak --><p>c</p>");
        let typography = Typography::default();
        let mut oracle = StubOracle::new(10.0);
        {
            let mut run = PaginationRun::new(&doc, &geometry(), &typography, &mut oracle).unwrap();
            assert!(run.step().unwrap());
            assert_eq!(run.pages_so_far(), 1);
            assert!(run.step().unwrap());
            assert!(!run.step().unwrap());
            assert!(run.is_done());
            let set = run.finish().unwrap();
            assert_eq!(set.total_pages(), 3);
        }
        assert_eq!(oracle.open_scaffolds, 0);
    }

    #[test]
    fn test_abandoned_run_releases_scaffold() {
        let doc = ContentDocument::parse("<p>a</p><!-- pagebreak --><p>b</p>");
        let typography = Typography::default();
        let mut oracle = StubOracle::new(10.0);
        {
            let mut run = PaginationRun::new(&doc, &geometry(), &typography, &mut oracle).unwrap();
            run.step().unwrap();
        }
        assert_eq!(oracle.released, 1);
        assert_eq!(oracle.open_scaffolds, 0);
    }

    #[test]
    fn test_height_tolerance() {
        let content = "<p>a</p><p>b</p>";
        let mut oracle = StubOracle::new(50.0).with(content, 100.4);
        let set = run(content, &mut oracle).unwrap();
        assert_eq!(set.total_pages(), 1);
    }
}
