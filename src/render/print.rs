//! Print-ready HTML assembly

use crate::layout::{PageGeometry, Typography};
use crate::render::footer::FooterTemplate;
use crate::render::page::PageSet;
use std::fmt::Write;

/// Class on each fixed-size page container
pub const PAGE_CLASS: &str = "print-page";

/// Builds one HTML document holding every page of a [`PageSet`], ready to
/// hand to a print or PDF backend.
pub struct PrintDocument<'a> {
    pages: &'a PageSet,
    footer: &'a FooterTemplate,
    typography: Option<&'a Typography>,
    page_size: Option<String>,
    title: String,
}

impl<'a> PrintDocument<'a> {
    pub fn new(pages: &'a PageSet, footer: &'a FooterTemplate) -> Self {
        Self {
            pages,
            footer,
            typography: None,
            page_size: None,
            title: String::new(),
        }
    }

    /// Apply the typography used during measurement to page content
    pub fn typography(mut self, typography: &'a Typography) -> Self {
        self.typography = Some(typography);
        self
    }

    /// `@page size` value; defaults to the geometry in pixels
    pub fn page_size(mut self, size: impl Into<String>) -> Self {
        self.page_size = Some(size.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Assemble the document
    pub fn render(&self) -> String {
        let geometry = self.pages.geometry();
        let total = self.pages.total_pages();
        let mut out = String::with_capacity(
            self.pages.iter().map(|p| p.markup.len() + 256).sum::<usize>() + 1024,
        );

        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(out, "<title>{}</title>", escape(&self.title));
        out.push_str("<style>\n");
        self.write_styles(&mut out, geometry);
        out.push_str("</style>\n</head>\n<body>\n");

        for page in self.pages {
            let last = page.index == total;
            let _ = writeln!(
                out,
                "<div class=\"{}\" data-page=\"{}\"{}{}>",
                PAGE_CLASS,
                page.index,
                if page.overflow { " data-overflow" } else { "" },
                if last {
                    ""
                } else {
                    " style=\"break-after: page; page-break-after: always\""
                }
            );
            out.push_str("<div class=\"print-content\">");
            out.push_str(&page.markup);
            out.push_str("</div>\n");
            let _ = writeln!(
                out,
                "<div class=\"print-footer\">{}</div>",
                escape(&self.footer.render(page.index, total))
            );
            out.push_str("</div>\n");
        }

        out.push_str("</body>\n</html>\n");
        out
    }

    fn write_styles(&self, out: &mut String, geometry: &PageGeometry) {
        let size = match &self.page_size {
            Some(size) => size.clone(),
            None => format!("{}px {}px", geometry.page_width, geometry.page_height),
        };
        let _ = writeln!(out, "@page {{ size: {}; margin: 0; }}", size);
        out.push_str("html, body { margin: 0; padding: 0; }\n");
        let _ = writeln!(
            out,
            ".{} {{ position: relative; box-sizing: border-box; overflow: hidden; \
             width: {}px; height: {}px; padding: {}px {}px {}px {}px; }}",
            PAGE_CLASS,
            geometry.page_width,
            geometry.page_height,
            geometry.margin_top,
            geometry.margin_right,
            geometry.margin_bottom,
            geometry.margin_left,
        );
        let _ = writeln!(
            out,
            ".print-content {{ width: {}px; height: {}px; overflow: hidden; }}",
            geometry.content_width(),
            geometry.content_height(),
        );
        // Oversized blocks grow the page instead of being clipped
        let _ = writeln!(
            out,
            ".{0}[data-overflow] {{ height: auto; min-height: {1}px; overflow: visible; }}\n\
             .{0}[data-overflow] .print-content {{ height: auto; overflow: visible; }}",
            PAGE_CLASS, geometry.page_height,
        );
        if let Some(typography) = self.typography {
            let _ = writeln!(out, ".print-content {{ {}; }}", typography.to_css());
        }
        let _ = writeln!(
            out,
            ".print-footer {{ position: absolute; left: {}px; right: {}px; bottom: {}px; \
             height: {}px; text-align: center; }}",
            geometry.margin_left, geometry.margin_right, geometry.margin_bottom, geometry.footer_height,
        );
    }
}

/// Escape text for HTML element content
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
